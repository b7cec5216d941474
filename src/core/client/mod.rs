// Cloud Datastore REST client
pub mod datastore;

// Kube-rs based Kubernetes client
pub mod kube_client;
pub mod kube_resources;
pub mod pod_lister_trait;
pub mod pods;
