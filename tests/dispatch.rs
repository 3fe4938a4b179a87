//! Dispatcher, cursor and descriptor behavior without any network
//!
//! Transports are replaced by closures that count their calls.

use abstract_sdk::descriptor::resolve_with;
use abstract_sdk::dispatch::Dispatcher;
use abstract_sdk::{
    CommitQuery, Cursor, CursorPhase, CursorState, Error, ErrorKind, FileDescriptor, Operation, Page,
    RequestOptions, ResponseCache, TransportError, TransportEvent, TransportId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn dispatcher(transports: &[TransportId]) -> Dispatcher {
    Dispatcher::new(transports.to_vec(), ResponseCache::new(10), None)
}

fn counted(counter: &AtomicUsize, result: Result<u32, TransportError>) -> Result<u32, TransportError> {
    counter.fetch_add(1, Ordering::SeqCst);
    result
}

mod fallback {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_everywhere_reports_each_transport() {
        let dispatcher = dispatcher(&[TransportId::Cli, TransportId::Api]);

        let err = dispatcher
            .dispatch(Operation::<u32>::new("nothing"))
            .await
            .unwrap_err();

        let Error::Aggregated(failure) = err else {
            panic!("expected aggregated failure");
        };
        assert_eq!(failure.len(), 2);
        assert!(failure.all(ErrorKind::TransportNotImplemented));
        let order: Vec<_> = failure.iter().map(|(t, _)| *t).collect();
        assert_eq!(order, vec![TransportId::Cli, TransportId::Api]);
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let dispatcher = dispatcher(&[TransportId::Api, TransportId::Cli]);
        let api_calls = &AtomicUsize::new(0);
        let cli_calls = &AtomicUsize::new(0);

        let value = dispatcher
            .dispatch(
                Operation::new("first")
                    .api(move || async move { counted(api_calls, Ok(1)) })
                    .cli(move || async move { counted(cli_calls, Ok(2)) }),
            )
            .await
            .unwrap();

        assert_eq!(value, 1);
        assert_eq!(api_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cli_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_through_in_order() {
        let dispatcher = dispatcher(&[TransportId::Cli, TransportId::Api]);
        let api_calls = &AtomicUsize::new(0);
        let cli_calls = &AtomicUsize::new(0);

        let value = dispatcher
            .dispatch(
                Operation::new("fallback")
                    .cli(move || async move {
                        counted(cli_calls, Err(TransportError::new(ErrorKind::Forbidden, "nope")))
                    })
                    .api(move || async move { counted(api_calls, Ok(7)) }),
            )
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(cli_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failures_are_kept_per_transport() {
        let dispatcher = dispatcher(&[TransportId::Api, TransportId::Cli]);

        let err = dispatcher
            .dispatch(
                Operation::<u32>::new("broken")
                    .api(move || async move { Err(TransportError::new(ErrorKind::NotFound, "missing")) })
                    .cli(move || async move { Err(TransportError::new(ErrorKind::Unauthorized, "denied")) }),
            )
            .await
            .unwrap_err();

        assert_eq!(err.transport_error(TransportId::Api).unwrap().kind, ErrorKind::NotFound);
        assert_eq!(err.transport_error(TransportId::Cli).unwrap().kind, ErrorKind::Unauthorized);
        assert_eq!(
            err.to_string(),
            "all transports failed: api (not_found: missing); cli (unauthorized: denied)"
        );
    }

    #[tokio::test]
    async fn test_empty_order_fails_without_calls() {
        let dispatcher = dispatcher(&[]);
        let calls = &AtomicUsize::new(0);

        let err = dispatcher
            .dispatch(Operation::new("none").api(move || async move { counted(calls, Ok(1)) }))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoTransportsConfigured));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_without_implementation_is_skipped() {
        let dispatcher = dispatcher(&[TransportId::Cli, TransportId::Api]);
        assert_eq!(dispatcher.transports(), &[TransportId::Cli, TransportId::Api]);

        let calls = &AtomicUsize::new(0);
        let operation = Operation::new("api only").api(move || async move { counted(calls, Ok(5)) });
        assert!(operation.supports(TransportId::Api));
        assert!(!operation.supports(TransportId::Cli));

        let value = dispatcher.dispatch(operation).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analytics_reports_winning_transport() {
        let events = Arc::new(Mutex::new(Vec::<TransportEvent>::new()));
        let sink = Arc::clone(&events);
        let dispatcher = Dispatcher::new(
            vec![TransportId::Cli, TransportId::Api],
            ResponseCache::default(),
            Some(Arc::new(move |event: &TransportEvent| sink.lock().unwrap().push(event.clone()))),
        );

        dispatcher
            .dispatch(Operation::new("projects.list").api(move || async move { Ok(3u32) }))
            .await
            .unwrap();
        let _ = dispatcher
            .dispatch(Operation::<u32>::new("projects.info"))
            .await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, "projects.list");
        assert_eq!(events[0].transport, TransportId::Api);
    }
}

mod caching {
    use super::*;

    #[tokio::test]
    async fn test_cached_value_is_returned_without_calls() {
        let dispatcher = dispatcher(&[TransportId::Api]);
        let calls = &AtomicUsize::new(0);

        for _ in 0..3 {
            let value = dispatcher
                .dispatch(
                    Operation::new("projects.info")
                        .api(move || async move { counted(calls, Ok(42)) })
                        .cache_key("project:p"),
                )
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.cache().get::<u32>("project:p"), Some(42));
    }

    #[tokio::test]
    async fn test_disabled_cache_neither_reads_nor_writes() {
        let dispatcher = dispatcher(&[TransportId::Api]);
        dispatcher.cache().insert("project:p", 1u32);
        let calls = &AtomicUsize::new(0);

        let value = dispatcher
            .dispatch(
                Operation::new("projects.info")
                    .api(move || async move { counted(calls, Ok(2)) })
                    .cache_key("project:other")
                    .options(RequestOptions::default().disable_cache()),
            )
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!dispatcher.cache().contains("project:other"));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let dispatcher = dispatcher(&[TransportId::Api]);

        let _ = dispatcher
            .dispatch(
                Operation::<u32>::new("projects.info")
                    .api(move || async move { Err(TransportError::unavailable("down")) })
                    .cache_key("project:p"),
            )
            .await;

        assert!(dispatcher.cache().is_empty());
    }
}

mod pagination {
    use super::*;

    /// Cursor over `total` items served `limit` at a time
    fn numbered(total: u64, limit: u64, fetches: Arc<AtomicUsize>) -> Cursor<Vec<u64>> {
        Cursor::new(move |state: Option<CursorState>| {
            let fetches = Arc::clone(&fetches);
            async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                let offset = state.and_then(|s| s.next_offset).unwrap_or(0);
                let end = (offset + limit).min(total);
                Ok(Page {
                    data: (offset..end).collect(),
                    state: CursorState {
                        limit,
                        offset,
                        next_offset: (end < total).then_some(end),
                        total,
                    },
                })
            }
        })
    }

    #[tokio::test]
    async fn test_unawaited_next_calls_chain_in_order() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let cursor = numbered(6, 2, Arc::clone(&fetches));

        let second = cursor.next();
        let third = cursor.next();

        assert_eq!(third.await.unwrap(), Some(vec![4, 5]));
        assert_eq!(second.await.unwrap(), Some(vec![2, 3]));
        assert_eq!(cursor.first_page().await.unwrap(), vec![0, 1]);
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_cursor_stops_fetching() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let cursor = numbered(3, 2, Arc::clone(&fetches));

        assert_eq!(cursor.next().await.unwrap(), Some(vec![2]));
        assert_eq!(cursor.phase(), CursorPhase::Exhausted);
        assert_eq!(cursor.next().await.unwrap(), None);
        assert_eq!(cursor.next().await.unwrap(), None);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pages_do_not_overlap() {
        let cursor = numbered(10, 3, Arc::new(AtomicUsize::new(0)));

        let pages = cursor.collect_pages().await.unwrap();
        let items: Vec<u64> = pages.into_iter().flatten().collect();
        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failed_page_fails_later_pages() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);
        let cursor: Cursor<Vec<u64>> = Cursor::new(move |state: Option<CursorState>| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                match state {
                    None => Ok(Page {
                        data: vec![0],
                        state: CursorState {
                            limit: 1,
                            offset: 0,
                            next_offset: Some(1),
                            total: 3,
                        },
                    }),
                    Some(_) => Err(Error::NoTransportsConfigured),
                }
            }
        });

        assert!(cursor.next().await.is_err());
        assert_eq!(cursor.phase(), CursorPhase::Failed);
        assert!(cursor.next().await.is_err());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}

mod descriptors {
    use super::*;

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let lookups = &AtomicUsize::new(0);
        let lookup = |_query: CommitQuery| {
            lookups.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>(vec!["abc".to_string(), "older".to_string()]) }
        };

        let resolved = resolve_with(FileDescriptor::new("p", "b", "f"), lookup).await.unwrap();
        assert_eq!(resolved.sha.as_str(), "abc");

        let again = resolve_with(resolved.clone(), lookup).await.unwrap();
        assert_eq!(again, resolved);
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
    }
}
