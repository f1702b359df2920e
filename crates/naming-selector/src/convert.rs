//! Conversion from mesh instance records to framework endpoints.
//!
//! Pure mappings, no failure modes; empty input yields empty output.

use naming_core::{Endpoint, METADATA_INSTANCE_ID};

use crate::mesh::MeshInstance;

/// Convert one instance.
///
/// With `with_metadata`, the instance metadata is copied over and the mesh
/// instance id is mirrored under the reserved [`METADATA_INSTANCE_ID`] key;
/// without it, the endpoint carries no metadata at all (the internal
/// workflow path wants the lean form).
pub fn convert_instance(instance: &MeshInstance, with_metadata: bool) -> Endpoint {
    let mut endpoint = Endpoint {
        host: instance.host.clone(),
        port: instance.port,
        is_ipv6: instance.is_ipv6,
        healthy: instance.healthy,
        weight: instance.weight,
        id: instance.id.clone(),
        metadata: Default::default(),
    };
    if with_metadata {
        endpoint.metadata = instance.metadata.clone();
        endpoint
            .metadata
            .insert(METADATA_INSTANCE_ID.to_string(), instance.id.clone());
    }
    endpoint
}

/// Convert a batch, preserving order and count, always with metadata.
pub fn convert_instances(instances: &[MeshInstance]) -> Vec<Endpoint> {
    instances
        .iter()
        .map(|instance| convert_instance(instance, true))
        .collect()
}

/// Convert a batch, dropping isolated or zero-weight instances.
///
/// Membership queries return the control plane's full view, including
/// administratively disabled instances; callers of the ALL policy expect
/// those excluded, so the filter lives here rather than in the SDK call.
pub fn convert_instances_skip_unusable(instances: &[MeshInstance]) -> Vec<Endpoint> {
    instances
        .iter()
        .filter(|instance| !instance.isolated && instance.weight != 0)
        .map(|instance| convert_instance(instance, true))
        .collect()
}
