use storefront::collection::{CollectionName, FindOptions, UpdateOptions, UpdateSpec};
use storefront::doc;
use storefront::errors::ErrorKind;
use storefront::filter::Query;
use storefront::source::DataSource;
use storefront_int_test::test_util::{cleanup, create_snapshot_test_context, ids, run_test};
use std::fs;

#[test]
fn test_writes_are_rejected() {
    run_test(
        create_snapshot_test_context,
        |ctx| {
            let context = ctx.context();
            let products = context.data_source(CollectionName::Products);
            assert!(!products.is_writable());
            let before = products.find(&Query::all(), &FindOptions::new())?;

            let err = products.create(doc!{ "id": "prod_100" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);
            let err = products
                .update(&Query::all(), &UpdateSpec::set(doc!{ "price": 0 }), UpdateOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);
            let err = products.delete(&Query::all(), Default::default()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);

            assert_eq!(products.find(&Query::all(), &FindOptions::new())?, before);
            assert!(!ctx.db_path().join("products.db").exists());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cache_refreshes_on_reset() {
    run_test(
        create_snapshot_test_context,
        |ctx| {
            let products = ctx.snapshot_source(CollectionName::Products);
            assert!(!products.is_cached());
            assert_eq!(products.count(&Query::all())?, 4);
            assert!(products.is_cached());

            ctx.write_fixture(CollectionName::Products, r#"[{"id":"prod_900"}]"#)?;
            assert_eq!(products.count(&Query::all())?, 4);

            products.reset()?;
            assert!(!products.is_cached());
            let all = products.find(&Query::all(), &FindOptions::new())?;
            assert_eq!(ids(&all), vec!["prod_900"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_malformed_fixture_is_an_error() {
    run_test(
        create_snapshot_test_context,
        |ctx| {
            fs::write(ctx.fixtures_dir().join("orders.json"), "[{\"id\": ")?;
            let orders = ctx.snapshot_source(CollectionName::Orders);
            let err = orders.count(&Query::all()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::EncodingError);
            assert!(!orders.is_cached());
            Ok(())
        },
        cleanup,
    )
}
