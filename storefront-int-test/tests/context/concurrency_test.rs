use parking_lot::Mutex;
use std::sync::{Arc, Barrier};
use std::thread;
use storefront::collection::CollectionName;
use storefront::filter::Query;
use storefront::store::InitOutcome;
use storefront_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_cold_start_seeds_once() {
    run_test(
        create_test_context,
        |ctx| {
            const THREADS: usize = 8;
            let context = ctx.context();
            let barrier = Arc::new(Barrier::new(THREADS));
            let outcomes = Arc::new(Mutex::new(Vec::new()));

            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let context = context.clone();
                    let barrier = barrier.clone();
                    let outcomes = outcomes.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        let collection = context.document_store().collection(CollectionName::Products);
                        let outcome = collection.ensure_ready();
                        let count = context
                            .data_source(CollectionName::Products)
                            .count(&Query::all());
                        outcomes.lock().push((outcome.ok(), count.ok()));
                    })
                })
                .collect();
            for handle in handles {
                handle.join().map_err(|_| "worker panicked")?;
            }

            let outcomes = outcomes.lock();
            assert_eq!(outcomes.len(), THREADS);
            let seeded = outcomes
                .iter()
                .filter(|(outcome, _)| *outcome == Some(InitOutcome::Seeded(4)))
                .count();
            assert_eq!(seeded, 1);
            for (outcome, count) in outcomes.iter() {
                assert!(matches!(
                    outcome,
                    Some(InitOutcome::Seeded(4)) | Some(InitOutcome::LoadedNonEmpty)
                ));
                assert_eq!(*count, Some(4));
            }

            let reopened = ctx.reopen(storefront::DataMode::DocumentStore);
            assert_eq!(reopened.data_source(CollectionName::Products).count(&Query::all())?, 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_creates_all_land() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            let handles: Vec<_> = (0..4)
                .map(|worker| {
                    let orders = context.service(CollectionName::Orders);
                    thread::spawn(move || {
                        for n in 0..25 {
                            let id = format!("orde_{}_{}", worker, n);
                            let created = orders.create(storefront::doc!{ "id": id, "worker": worker });
                            assert!(created.is_ok());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().map_err(|_| "worker panicked")?;
            }

            let orders = context.data_source(CollectionName::Orders);
            assert_eq!(orders.count(&Query::all())?, 100);
            assert_eq!(orders.count(&Query::new().eq("worker", 2))?, 25);
            Ok(())
        },
        cleanup,
    )
}
