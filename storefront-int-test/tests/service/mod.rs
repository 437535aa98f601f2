mod entity_service_test;
