//! Async combinators: ordering under variable delays and cleanup on drop.

mod test_support;

use std::time::Duration;

use futures::StreamExt;

use iterq_async::{from_stream, lift, AsyncSequence, AsyncSequenceExt};
use iterq_core::hierarchy::hierarchy_fn;
use iterq_core::Error;
use test_support::{event_log, CountedSource};

#[tokio::test]
async fn test_filter_then_map_keeps_source_order() {
    let delays = [40u64, 3, 25, 0, 12, 7, 30];
    let seq = lift(CountedSource::new(delays.len() as i64))
        .filter_async(move |i| {
            let delay = delays[*i as usize];
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(delay != 25)
            }
        })
        .map_async(move |i| {
            let delay = delays[i as usize];
            async move {
                tokio::time::sleep(Duration::from_millis(40 - delay)).await;
                Ok((i, delay))
            }
        });
    let got = seq.to_vec().await.unwrap();
    assert_eq!(got, vec![(0, 40), (1, 3), (3, 0), (4, 12), (5, 7), (6, 30)]);
}

#[tokio::test]
async fn test_take_closes_lifted_source_once() {
    let source = CountedSource::new(50);
    let counters = source.counters();
    let firsts = lift(source).map(|n| n * 2).take(3);
    assert_eq!(firsts.to_vec().await.unwrap(), vec![0, 2, 4]);
    assert_eq!(counters.closes.get(), 1);
}

#[tokio::test]
async fn test_dropped_iterator_closes_chain() {
    let source = CountedSource::new(50);
    let counters = source.counters();
    let chain = lift(source).filter(|n| n % 5 == 0);
    {
        let mut iter = chain.iter().unwrap();
        assert_eq!(iter.next().await.unwrap().unwrap(), 0);
        assert_eq!(iter.next().await.unwrap().unwrap(), 5);
    }
    assert_eq!(counters.closes.get(), 1);
}

#[tokio::test]
async fn test_stream_source_is_one_shot() {
    let sorted = from_stream(futures::stream::iter(vec![3, 1, 2])).order_by(|n| *n);
    assert_eq!(sorted.to_vec().await.unwrap(), vec![1, 2, 3]);
    assert!(matches!(sorted.to_vec().await, Err(Error::Consumed)));
}

#[tokio::test]
async fn test_iter_into_stream() {
    let seq = lift(CountedSource::new(4)).skip(1);
    let items: Vec<i64> = seq
        .iter()
        .unwrap()
        .into_stream()
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(items, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_async_zip_closes_longer_side() {
    let log = event_log();
    let left = lift(CountedSource::logged("left", 4, &log));
    let right = lift(CountedSource::logged("right", 2, &log));
    assert_eq!(left.zip(right).count().await.unwrap(), 2);
    let events = log.borrow();
    assert_eq!(events.iter().filter(|e| *e == "left:close").count(), 1);
    assert_eq!(events.iter().filter(|e| *e == "right:close").count(), 0);
    assert_eq!(events.last().map(String::as_str), Some("left:close"));
}

#[tokio::test]
async fn test_async_concat_defers_right_open() {
    let log = event_log();
    let left = lift(CountedSource::logged("left", 2, &log));
    let right = lift(CountedSource::logged("right", 2, &log));
    let chain = left.concat(right);
    let mut iter = chain.iter().unwrap();
    assert_eq!(iter.next().await.unwrap().unwrap(), 0);
    assert_eq!(iter.next().await.unwrap().unwrap(), 1);
    assert!(log.borrow().iter().all(|e| e.starts_with("left:")));
    assert_eq!(iter.next().await.unwrap().unwrap(), 0);
    assert!(log.borrow().iter().any(|e| e == "right:open"));
    drop(iter);
    assert_eq!(log.borrow().last().map(String::as_str), Some("right:close"));
}

#[tokio::test]
async fn test_async_take_while_stops_and_closes() {
    let source = CountedSource::new(100);
    let counters = source.counters();
    let small = lift(source).take_while(|n| *n < 3);
    assert_eq!(small.to_vec().await.unwrap(), vec![0, 1, 2]);
    assert_eq!(counters.pulls.get(), 4);
    assert_eq!(counters.closes.get(), 1);
}

#[tokio::test]
async fn test_async_error_keeps_failed_cleanup() {
    let source = CountedSource::failing_at(10, 2).close_fails();
    let counters = source.counters();
    let err = lift(source).map(|n| n * 2).to_vec().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Cleanup { ref error, ref cleanup }
            if matches!(**error, Error::Source(ref m) if m == "failed at 2")
                && matches!(**cleanup, Error::Source(ref m) if m == "close failed")
    ));
    assert_eq!(counters.closes.get(), 1);
}

#[tokio::test]
async fn test_stream_gains_hierarchy_for_traversal_composition() {
    let h = hierarchy_fn(|n: &i64| (*n > 0).then(|| n - 1), |n: &i64| vec![n + 1]);
    let seq = from_stream(futures::stream::iter(vec![3i64, 1, 2]))
        .to_hierarchy(h.clone())
        .through(|s| s.filter(|n| *n != 1));
    assert!(seq.hierarchy().unwrap().same_provider(&h));
    let (prefix, rest) = seq
        .span_async(|n, _| {
            let keep = *n > 2;
            async move { Ok::<_, Error>(keep) }
        })
        .await
        .unwrap();
    assert_eq!(prefix.to_vec().await.unwrap(), vec![3]);
    assert!(rest.hierarchy().unwrap().same_provider(&h));
    assert_eq!(rest.to_vec().await.unwrap(), vec![2]);
}
