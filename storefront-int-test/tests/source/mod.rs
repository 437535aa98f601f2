mod backend_parity_test;
mod document_store_test;
mod pagination_test;
mod snapshot_test;
