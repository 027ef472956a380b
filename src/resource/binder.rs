//! Generic CRUD binder
//!
//! Drives one resource type's lifecycle against a [`ResourceClient`] using
//! only its compiled schema: input attributes are extracted from the instance,
//! sent to the backend, and the backend's returned state is applied back.
//! Every operation makes exactly one backend call and never retries.

use super::registry::ResourceDefinition;
use crate::client::{ClientError, ResourceClient};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::instance::Instance;
use crate::schema::{AttributeSchema, Element, Kind, Mutability, SchemaMap};
use crate::value::{AttrMap, AttrValue};
use serde_json::{Map, Value};

/// Collect the attributes sent to the backend: everything set on the
/// instance except computed-only attributes. Sets are deduplicated in
/// first-seen order at every nesting level.
pub fn extract(instance: &Instance, schema: &SchemaMap) -> AttrMap {
    schema
        .iter()
        .filter(|(_, attribute)| attribute.mutability != Mutability::ComputedOnly)
        .filter_map(|(name, attribute)| {
            instance
                .get(name)
                .map(|value| (name.clone(), normalize(value, attribute)))
        })
        .collect()
}

// Instances seeded without conformance may still hold duplicate set members.
fn normalize(value: &AttrValue, schema: &AttributeSchema) -> AttrValue {
    match value {
        AttrValue::Sequence(items) => {
            // A singleton object may be given as a one-element sequence
            let item_schema = match &schema.element {
                Some(Element::Nested(inner)) => Some(&**inner),
                _ if schema.kind == Kind::NestedObject => Some(schema),
                _ => None,
            };

            let mut normalized: Vec<AttrValue> = Vec::with_capacity(items.len());
            for item in items {
                let item = match item_schema {
                    Some(inner) => normalize(item, inner),
                    None => item.clone(),
                };
                if schema.kind == Kind::Set && normalized.contains(&item) {
                    continue;
                }
                normalized.push(item);
            }
            AttrValue::Sequence(normalized)
        }
        AttrValue::Mapping(entries) => AttrValue::Mapping(
            entries
                .iter()
                .map(|(key, entry)| {
                    let entry_schema = match (&schema.element, &schema.children) {
                        (_, Some(children)) => children.get(key),
                        (Some(Element::Nested(inner)), None) if schema.kind == Kind::Map => {
                            Some(&**inner)
                        }
                        _ => None,
                    };
                    let entry = match entry_schema {
                        Some(child) => normalize(entry, child),
                        None => entry.clone(),
                    };
                    (key.clone(), entry)
                })
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Write backend-returned values onto the instance. Attributes unknown to
/// the schema are ignored; `null` unsets. Every attribute is attempted and
/// each failure becomes a warning.
pub fn apply(instance: &mut Instance, values: &Map<String, Value>, schema: &SchemaMap) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for (name, raw) in values {
        let Some(attribute) = schema.get(name) else {
            continue;
        };

        let result = match AttrValue::from_json(raw) {
            Ok(Some(value)) => instance.set(name, value, attribute),
            Ok(None) => {
                instance.unset(name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::warn!("Failed to set {}: {}", name, e);
            diagnostics.push(
                Diagnostic::warning(format!("error setting {}", name))
                    .with_detail(e.to_string())
                    .with_attribute(name.clone()),
            );
        }
    }

    diagnostics
}

fn client_failure(action: &str, resource_type: &str, error: &ClientError) -> Diagnostic {
    tracing::error!("Failed {} {}: {}", action, resource_type, error);
    Diagnostic::error(format!("error {} {}", action, resource_type)).with_detail(error.to_string())
}

fn missing_identity(action: &str, resource_type: &str) -> Diagnostic {
    Diagnostic::error(format!("error {} {}", action, resource_type))
        .with_detail("resource has no identity")
}

impl ResourceDefinition {
    /// Create the resource; on success the instance takes the returned id
    pub async fn create(&self, client: &dyn ResourceClient, instance: &mut Instance) -> Diagnostics {
        let attributes = extract(instance, &self.schema);
        tracing::info!(
            "Creating {} with {} attributes",
            self.resource_type,
            attributes.len()
        );

        match client.create(&self.resource_type, &attributes).await {
            Ok(response) if response.id.is_empty() => {
                tracing::error!("Backend created {} without an id", self.resource_type);
                vec![Diagnostic::error(format!("error creating {}", self.resource_type))
                    .with_detail("backend returned an empty id")]
            }
            Ok(response) => {
                instance.set_id(response.id);
                apply(instance, &response.attributes, &self.schema)
            }
            Err(e) => vec![client_failure("creating", &self.resource_type, &e)],
        }
    }

    /// Refresh the instance from the backend; an absent resource clears the
    /// instance's identity
    pub async fn read(&self, client: &dyn ResourceClient, instance: &mut Instance) -> Diagnostics {
        let Some(id) = instance.id().map(str::to_string) else {
            return vec![missing_identity("reading", &self.resource_type)];
        };
        tracing::info!("Reading {} {}", self.resource_type, id);

        match client.read(&self.resource_type, &id).await {
            Ok(Some(response)) => apply(instance, &response.attributes, &self.schema),
            Ok(None) => {
                tracing::info!("{} {} no longer exists", self.resource_type, id);
                instance.clear_id();
                Diagnostics::new()
            }
            Err(e) => vec![client_failure("reading", &self.resource_type, &e)],
        }
    }

    /// Send the instance's inputs to the backend; identity never changes
    pub async fn update(&self, client: &dyn ResourceClient, instance: &mut Instance) -> Diagnostics {
        let Some(id) = instance.id().map(str::to_string) else {
            return vec![missing_identity("updating", &self.resource_type)];
        };
        let attributes = extract(instance, &self.schema);
        tracing::info!("Updating {} {}", self.resource_type, id);

        match client.update(&self.resource_type, &id, &attributes).await {
            Ok(response) => apply(instance, &response.attributes, &self.schema),
            Err(e) => vec![client_failure("updating", &self.resource_type, &e)],
        }
    }

    /// Delete the resource; on success the instance's identity is cleared
    pub async fn delete(&self, client: &dyn ResourceClient, instance: &mut Instance) -> Diagnostics {
        let Some(id) = instance.id().map(str::to_string) else {
            return vec![missing_identity("deleting", &self.resource_type)];
        };
        tracing::info!("Deleting {} {}", self.resource_type, id);

        match client.delete(&self.resource_type, &id).await {
            Ok(()) => {
                instance.clear_id();
                Diagnostics::new()
            }
            Err(e) => vec![client_failure("deleting", &self.resource_type, &e)],
        }
    }
}
