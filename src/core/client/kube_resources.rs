/// Kubernetes resource types used by this crate, re-exported from k8s-openapi.
pub use k8s_openapi::api::core::v1::Pod;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
