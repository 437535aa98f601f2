use storefront::collection::{limit_to, skip_by, CollectionName, FindOptions};
use storefront::common::SortOrder;
use storefront::filter::Query;
use storefront::source::DataSource;
use std::sync::Arc;
use storefront_int_test::test_util::{cleanup, create_test_context, ids, run_test};

#[test]
fn test_skip_and_limit_bounds() {
    run_test(
        create_test_context,
        |ctx| {
            let sources: [Arc<dyn DataSource>; 2] = [
                ctx.document_source(CollectionName::Products),
                ctx.snapshot_source(CollectionName::Products),
            ];
            for source in sources {
                let all = Query::all();
                let total = source.count(&all)?;
                assert_eq!(total, 4);

                assert!(source.find(&all, &skip_by(total))?.is_empty());
                assert!(source.find(&all, &skip_by(total + 10))?.is_empty());
                assert!(source.find(&all, &limit_to(0))?.is_empty());

                for skip in 0..=total + 1 {
                    for limit in 0..=total + 1 {
                        let page = source.find(&all, &FindOptions::new().skip(skip).limit(limit))?;
                        let expected = total.saturating_sub(skip).min(limit);
                        assert_eq!(page.len(), expected, "skip {} limit {}", skip, limit);
                    }
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pages_cover_collection_once() {
    run_test(
        create_test_context,
        |ctx| {
            let source = ctx.document_source(CollectionName::Products);
            let mut seen = Vec::new();
            for page in 0..3 {
                let options = FindOptions::new()
                    .sort_by("price", SortOrder::Ascending)
                    .skip(page * 2)
                    .limit(2);
                seen.extend(ids(&source.find(&Query::all(), &options)?));
            }
            assert_eq!(seen, vec!["prod_004", "prod_001", "prod_002", "prod_003"]);
            Ok(())
        },
        cleanup,
    )
}
