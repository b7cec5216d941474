pub mod pod_list_service;
