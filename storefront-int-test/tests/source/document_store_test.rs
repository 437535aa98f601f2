use storefront::collection::{delete_one, update_all, upsert, CollectionName, FindOptions, UpdateOptions, UpdateSpec};
use storefront::doc;
use storefront::errors::ErrorKind;
use storefront::filter::Query;
use storefront::DataMode;
use serde_json::json;
use storefront_int_test::test_util::{cleanup, create_test_context, ids, run_test};

#[test]
fn test_create_then_find() {
    run_test(
        create_test_context,
        |ctx| {
            let customers = ctx.document_source(CollectionName::Customers);
            let created = customers.create(doc!{
                "id": "cust_010",
                "email": "linus@example.com",
                "name": "Linus"
            })?;
            assert!(created.created_at().is_some());
            assert_eq!(created.created_at(), created.updated_at());

            let found = customers.find_one(&Query::by_id("cust_010"))?;
            assert_eq!(found.as_ref(), Some(&created));
            assert_eq!(customers.count(&Query::all())?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_writes_survive_reopen() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.document_source(CollectionName::Products);
            products.create(doc!{ "id": "prod_100", "category": "Books", "price": 5 })?;
            products.update(
                &Query::by_id("prod_003"),
                &UpdateSpec::set(doc!{ "stock": 8 }),
                UpdateOptions::default(),
            )?;
            products.delete(&Query::by_id("prod_004"), delete_one())?;

            let reopened = ctx.reopen(DataMode::DocumentStore);
            let products = reopened.data_source(CollectionName::Products);
            let all = products.find(&Query::all(), &FindOptions::new())?;
            assert_eq!(ids(&all), vec!["prod_001", "prod_002", "prod_003", "prod_100"]);
            let keyboard = products.find_one(&Query::by_id("prod_003"))?;
            assert_eq!(keyboard.and_then(|d| d.get("stock").cloned()), Some(json!(8)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_fields_are_enforced() {
    run_test(
        create_test_context,
        |ctx| {
            let customers = ctx.document_source(CollectionName::Customers);

            let err = customers
                .create(doc!{ "id": "cust_001", "email": "new@example.com" })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

            let err = customers
                .create(doc!{ "id": "cust_011", "email": "ada@example.com" })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

            let err = customers
                .create(doc!{ "email": "nobody@example.com" })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);

            assert_eq!(customers.count(&Query::all())?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_set_touches_only_updated_at() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.document_source(CollectionName::Products);
            let query = Query::by_id("prod_002");
            let before = products.find_one(&query)?.unwrap();

            let changed = products.update(&query, &UpdateSpec::set(doc!{}), UpdateOptions::default())?;
            assert_eq!(changed, 1);

            let mut after = products.find_one(&query)?.unwrap();
            assert_ne!(after.updated_at(), before.updated_at());
            let mut before = before;
            before.remove("updated_at");
            after.remove("updated_at");
            assert_eq!(after, before);

            let missing = products.update(
                &Query::by_id("prod_404"),
                &UpdateSpec::set(doc!{}),
                UpdateOptions::default(),
            )?;
            assert_eq!(missing, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_and_delete_counts() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.document_source(CollectionName::Products);
            let books = Query::new().eq("category", "Books");
            let discount = UpdateSpec::from_document(&doc!{ "$set": { "on_sale": true } })?;

            assert_eq!(products.update(&books, &discount, UpdateOptions::default())?, 1);
            assert_eq!(products.count(&Query::new().eq("on_sale", true))?, 1);
            assert_eq!(products.update(&books, &discount, update_all())?, 2);
            assert_eq!(products.count(&Query::new().eq("on_sale", true))?, 2);

            let created = products.update(
                &Query::by_id("prod_200"),
                &UpdateSpec::set(doc!{ "category": "Games" }),
                upsert(),
            )?;
            assert_eq!(created, 1);
            let game = products.find_one(&Query::by_id("prod_200"))?.unwrap();
            assert_eq!(game.get_str("category"), Some("Games"));

            assert_eq!(products.delete(&books, delete_one())?, 1);
            assert_eq!(products.delete(&books, Default::default())?, 1);
            assert_eq!(products.count(&books)?, 0);
            assert_eq!(products.count(&Query::all())?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_writes_reach_nested_items() {
    run_test(
        create_test_context,
        |ctx| {
            let reviews = ctx.document_source(CollectionName::Reviews);
            let changed = reviews.update(
                &Query::by_id("revi_003"),
                &UpdateSpec::set(doc!{ "rating": 1 }),
                UpdateOptions::default(),
            )?;
            assert_eq!(changed, 1);
            let review = reviews.find_one(&Query::by_id("revi_003"))?.unwrap();
            assert_eq!(review.get("rating"), Some(&json!(1)));

            assert_eq!(reviews.delete(&Query::new().eq("customer_id", "cust_002"), Default::default())?, 2);
            let remaining = reviews.find(&Query::all(), &FindOptions::new())?;
            assert_eq!(ids(&remaining), vec!["revi_001"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_reset_restores_fixture() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.document_source(CollectionName::Products);
            products.delete(&Query::all(), Default::default())?;
            assert_eq!(products.count(&Query::all())?, 0);

            products.reset()?;
            assert_eq!(products.count(&Query::all())?, 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dotted_paths_in_updates_and_listings() {
    run_test(
        create_test_context,
        |ctx| {
            let customers = ctx.document_source(CollectionName::Customers);
            customers.create(doc!{
                "id": "cust_020",
                "email": "lyon@example.com",
                "address": { "city": "Lyon", "zip": "69001" }
            })?;

            let moved = UpdateSpec::from_document(&doc!{ "$set": { "address.city": "Paris" } })?;
            assert_eq!(customers.update(&Query::by_id("cust_020"), &moved, UpdateOptions::default())?, 1);
            let dropped = UpdateSpec::from_document(&doc!{ "$unset": { "address.zip": "" } })?;
            customers.update(&Query::by_id("cust_020"), &dropped, UpdateOptions::default())?;

            let reopened = ctx.reopen(DataMode::DocumentStore);
            let found = reopened
                .data_source(CollectionName::Customers)
                .find_one(&Query::by_id("cust_020"))?
                .unwrap();
            assert_eq!(found.get("address"), Some(&json!({ "city": "Paris" })));

            let options = storefront::service::ListOptions::from_params(&doc!{ "address.city": "Paris" })?;
            let page = reopened.service(CollectionName::Customers).get_all(&options)?;
            assert_eq!(ids(&page.items), vec!["cust_020"]);
            Ok(())
        },
        cleanup,
    )
}
