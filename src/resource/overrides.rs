//! Hand-authored resource definitions
//!
//! These replace the compiled schema of the same resource type. They carry
//! the attribute subset the backend actually models, including nested `id`
//! attributes where the backend keeps them (the reserved-name filtering of the
//! block compiler does not apply here).

use super::registry::ResourceDefinition;
use crate::schema::{AttributeSchema as S, Cardinality, Element, Kind, Mutability, SchemaMap};

use crate::schema::Mutability::{
    ComputedOnly as Computed, OptionalComputed, OptionalInput as Optional,
    RequiredInput as Required,
};

/// Resource types with a hand-authored definition
pub const HAND_AUTHORED_TYPES: [&str; 6] = [
    "aws_instance",
    "aws_s3_bucket",
    "aws_s3_bucket_policy",
    "aws_security_group",
    "aws_subnet",
    "aws_vpc",
];

/// All hand-authored definitions
pub fn hand_authored() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition::new("aws_instance", instance()),
        ResourceDefinition::new("aws_s3_bucket", s3_bucket()),
        ResourceDefinition::new("aws_s3_bucket_policy", s3_bucket_policy()),
        ResourceDefinition::new("aws_security_group", security_group()),
        ResourceDefinition::new("aws_subnet", subnet()),
        ResourceDefinition::new("aws_vpc", vpc()),
    ]
}

fn attrs<const N: usize>(entries: [(&str, S); N]) -> SchemaMap {
    entries
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect()
}

fn string_map(mutability: Mutability) -> S {
    S::collection(Kind::Map, Element::Primitive(Kind::String), mutability)
}

fn string_list(mutability: Mutability) -> S {
    S::collection(Kind::List, Element::Primitive(Kind::String), mutability)
}

fn string_set(mutability: Mutability) -> S {
    S::collection(Kind::Set, Element::Primitive(Kind::String), mutability)
}

/// List block holding at most one object
fn single(children: SchemaMap, mutability: Mutability) -> S {
    S::block(Kind::List, children, mutability).with_cardinality(Cardinality::singleton())
}

/// List block holding exactly one object
fn exactly_one(children: SchemaMap) -> S {
    S::block(Kind::List, children, Required).with_cardinality(Cardinality {
        min_items: Some(1),
        max_items: Some(1),
    })
}

fn tags() -> [(&'static str, S); 2] {
    [
        ("tags", string_map(Optional)),
        ("tags_all", string_map(OptionalComputed)),
    ]
}

fn with_tags<const N: usize>(entries: [(&str, S); N]) -> SchemaMap {
    let mut schema = attrs(entries);
    schema.extend(attrs(tags()));
    schema
}

fn s3_bucket_policy() -> SchemaMap {
    attrs([("bucket", S::string(Required)), ("policy", S::string(Required))])
}

fn s3_bucket() -> SchemaMap {
    let mut schema = with_tags([
        ("acceleration_status", S::string(OptionalComputed)),
        ("acl", S::string(OptionalComputed)),
        ("arn", S::string(Computed)),
        ("bucket", S::string(OptionalComputed)),
        ("bucket_domain_name", S::string(Computed)),
        ("bucket_prefix", S::string(OptionalComputed)),
        ("bucket_regional_domain_name", S::string(Computed)),
        ("force_destroy", S::bool(Optional)),
        ("hosted_zone_id", S::string(Computed)),
        ("object_lock_enabled", S::bool(OptionalComputed)),
        ("policy", S::string(OptionalComputed)),
        ("region", S::string(Computed)),
        ("request_payer", S::string(OptionalComputed)),
        ("website_domain", S::string(Computed)),
        ("website_endpoint", S::string(Computed)),
    ]);

    schema.extend(attrs([
        (
            "cors_rule",
            S::block(
                Kind::List,
                attrs([
                    ("allowed_headers", string_list(Optional)),
                    ("allowed_methods", string_list(Required)),
                    ("allowed_origins", string_list(Required)),
                    ("expose_headers", string_list(Optional)),
                    ("max_age_seconds", S::int(Optional)),
                ]),
                OptionalComputed,
            ),
        ),
        (
            "grant",
            S::block(
                Kind::Set,
                attrs([
                    ("id", S::string(Optional)),
                    ("permissions", string_set(Required)),
                    ("type", S::string(Required)),
                    ("uri", S::string(Optional)),
                ]),
                OptionalComputed,
            ),
        ),
        ("lifecycle_rule", lifecycle_rule()),
        (
            "logging",
            single(
                attrs([
                    ("target_bucket", S::string(Required)),
                    ("target_prefix", S::string(Optional)),
                ]),
                OptionalComputed,
            ),
        ),
        (
            "object_lock_configuration",
            single(
                attrs([
                    ("object_lock_enabled", S::string(Optional)),
                    (
                        "rule",
                        single(
                            attrs([(
                                "default_retention",
                                exactly_one(attrs([
                                    ("days", S::int(Optional)),
                                    ("mode", S::string(Required)),
                                    ("years", S::int(Optional)),
                                ])),
                            )]),
                            Optional,
                        ),
                    ),
                ]),
                OptionalComputed,
            ),
        ),
        (
            "replication_configuration",
            single(
                attrs([
                    ("role", S::string(Required)),
                    ("rules", replication_rules()),
                ]),
                OptionalComputed,
            ),
        ),
        (
            "server_side_encryption_configuration",
            single(
                attrs([(
                    "rule",
                    single(
                        attrs([
                            ("bucket_key_enabled", S::bool(Optional)),
                            (
                                "apply_server_side_encryption_by_default",
                                single(
                                    attrs([
                                        ("kms_master_key_id", S::string(Optional)),
                                        ("sse_algorithm", S::string(Required)),
                                    ]),
                                    Required,
                                ),
                            ),
                        ]),
                        Required,
                    ),
                )]),
                OptionalComputed,
            ),
        ),
        (
            "versioning",
            single(
                attrs([
                    ("enabled", S::bool(Optional)),
                    ("mfa_delete", S::bool(Optional)),
                ]),
                OptionalComputed,
            ),
        ),
        (
            "website",
            single(
                attrs([
                    ("error_document", S::string(Optional)),
                    ("index_document", S::string(Optional)),
                    ("redirect_all_requests_to", S::string(Optional)),
                    ("routing_rules", S::string(Optional)),
                ]),
                OptionalComputed,
            ),
        ),
    ]));

    schema
}

fn lifecycle_rule() -> S {
    S::block(
        Kind::List,
        attrs([
            ("abort_incomplete_multipart_upload_days", S::int(Optional)),
            ("enabled", S::bool(Required)),
            ("id", S::string(OptionalComputed)),
            ("prefix", S::string(Optional)),
            ("tags", string_map(Optional)),
            (
                "expiration",
                single(
                    attrs([
                        ("date", S::string(Optional)),
                        ("days", S::int(Optional)),
                        ("expired_object_delete_marker", S::bool(Optional)),
                    ]),
                    Optional,
                ),
            ),
            (
                "noncurrent_version_expiration",
                single(attrs([("days", S::int(Optional))]), Optional),
            ),
            (
                "noncurrent_version_transition",
                S::block(
                    Kind::Set,
                    attrs([
                        ("days", S::int(Optional)),
                        ("storage_class", S::string(Required)),
                    ]),
                    Optional,
                ),
            ),
            (
                "transition",
                S::block(
                    Kind::Set,
                    attrs([
                        ("date", S::string(Optional)),
                        ("days", S::int(Optional)),
                        ("storage_class", S::string(Required)),
                    ]),
                    Optional,
                ),
            ),
        ]),
        OptionalComputed,
    )
}

fn replication_rules() -> S {
    let minutes_status = || {
        attrs([
            ("minutes", S::int(Optional)),
            ("status", S::string(Optional)),
        ])
    };

    let destination = exactly_one(attrs([
        ("account_id", S::string(Optional)),
        ("bucket", S::string(Required)),
        ("replica_kms_key_id", S::string(Optional)),
        ("storage_class", S::string(Optional)),
        (
            "access_control_translation",
            single(attrs([("owner", S::string(Required))]), Optional),
        ),
        ("metrics", single(minutes_status(), Optional)),
        ("replication_time", single(minutes_status(), Optional)),
    ]));

    S::block(
        Kind::Set,
        attrs([
            ("delete_marker_replication_status", S::string(Optional)),
            ("id", S::string(Optional)),
            ("prefix", S::string(Optional)),
            ("priority", S::int(Optional)),
            ("status", S::string(Required)),
            ("destination", destination),
            (
                "filter",
                single(
                    attrs([
                        ("prefix", S::string(Optional)),
                        ("tags", string_map(Optional)),
                    ]),
                    Optional,
                ),
            ),
            (
                "source_selection_criteria",
                single(
                    attrs([(
                        "sse_kms_encrypted_objects",
                        single(attrs([("enabled", S::bool(Required))]), Optional),
                    )]),
                    Optional,
                ),
            ),
        ]),
        Required,
    )
}

fn vpc() -> SchemaMap {
    with_tags([
        ("arn", S::string(Computed)),
        ("assign_generated_ipv6_cidr_block", S::bool(OptionalComputed)),
        ("cidr_block", S::string(OptionalComputed)),
        ("default_network_acl_id", S::string(Computed)),
        ("default_route_table_id", S::string(Computed)),
        ("default_security_group_id", S::string(Computed)),
        ("dhcp_options_id", S::string(Computed)),
        ("enable_dns_hostnames", S::bool(OptionalComputed)),
        ("enable_dns_support", S::bool(OptionalComputed)),
        ("enable_network_address_usage_metrics", S::bool(OptionalComputed)),
        ("instance_tenancy", S::string(OptionalComputed)),
        ("ipv4_ipam_pool_id", S::string(Optional)),
        ("ipv4_netmask_length", S::int(Optional)),
        ("ipv6_association_id", S::string(Computed)),
        ("ipv6_cidr_block", S::string(OptionalComputed)),
        ("ipv6_cidr_block_network_border_group", S::string(OptionalComputed)),
        ("ipv6_ipam_pool_id", S::string(Optional)),
        ("ipv6_netmask_length", S::int(Optional)),
        ("main_route_table_id", S::string(Computed)),
        ("owner_id", S::string(Computed)),
    ])
}

fn subnet() -> SchemaMap {
    with_tags([
        ("arn", S::string(Computed)),
        ("assign_ipv6_address_on_creation", S::bool(OptionalComputed)),
        ("availability_zone", S::string(OptionalComputed)),
        ("availability_zone_id", S::string(OptionalComputed)),
        ("cidr_block", S::string(OptionalComputed)),
        ("customer_owned_ipv4_pool", S::string(Optional)),
        ("enable_dns64", S::bool(OptionalComputed)),
        ("enable_lni_at_device_index", S::int(OptionalComputed)),
        (
            "enable_resource_name_dns_a_record_on_launch",
            S::bool(OptionalComputed),
        ),
        (
            "enable_resource_name_dns_aaaa_record_on_launch",
            S::bool(OptionalComputed),
        ),
        ("ipv6_cidr_block", S::string(OptionalComputed)),
        ("ipv6_cidr_block_association_id", S::string(Computed)),
        ("ipv6_native", S::bool(OptionalComputed)),
        ("map_customer_owned_ip_on_launch", S::bool(OptionalComputed)),
        ("map_public_ip_on_launch", S::bool(OptionalComputed)),
        ("outpost_arn", S::string(Optional)),
        ("owner_id", S::string(Computed)),
        ("private_dns_hostname_type_on_launch", S::string(OptionalComputed)),
        ("vpc_id", S::string(Required)),
    ])
}

fn security_group_rule() -> S {
    S::block(
        Kind::Set,
        attrs([
            ("cidr_blocks", string_list(Optional)),
            ("description", S::string(Optional)),
            ("from_port", S::int(Required)),
            ("ipv6_cidr_blocks", string_list(Optional)),
            ("prefix_list_ids", string_list(Optional)),
            ("protocol", S::string(Required)),
            ("security_groups", string_set(Optional)),
            ("self", S::bool(Optional)),
            ("to_port", S::int(Required)),
        ]),
        OptionalComputed,
    )
}

fn security_group() -> SchemaMap {
    with_tags([
        ("arn", S::string(Computed)),
        ("description", S::string(OptionalComputed)),
        ("egress", security_group_rule()),
        ("ingress", security_group_rule()),
        ("name", S::string(OptionalComputed)),
        ("name_prefix", S::string(OptionalComputed)),
        ("owner_id", S::string(Computed)),
        ("revoke_rules_on_delete", S::bool(Optional)),
        ("vpc_id", S::string(OptionalComputed)),
    ])
}

fn instance() -> SchemaMap {
    let mut schema = with_tags([
        ("ami", S::string(OptionalComputed)),
        ("arn", S::string(Computed)),
        ("associate_public_ip_address", S::bool(OptionalComputed)),
        ("availability_zone", S::string(OptionalComputed)),
        ("cpu_core_count", S::int(OptionalComputed)),
        ("cpu_threads_per_core", S::int(OptionalComputed)),
        ("disable_api_stop", S::bool(OptionalComputed)),
        ("disable_api_termination", S::bool(OptionalComputed)),
        ("ebs_optimized", S::bool(OptionalComputed)),
        ("get_password_data", S::bool(Optional)),
        ("hibernation", S::bool(Optional)),
        ("host_id", S::string(OptionalComputed)),
        ("host_resource_group_arn", S::string(OptionalComputed)),
        ("iam_instance_profile", S::string(OptionalComputed)),
        ("instance_initiated_shutdown_behavior", S::string(OptionalComputed)),
        ("instance_lifecycle", S::string(Computed)),
        ("instance_state", S::string(Computed)),
        ("instance_type", S::string(OptionalComputed)),
        ("ipv6_address_count", S::int(OptionalComputed)),
        ("ipv6_addresses", string_list(OptionalComputed)),
        ("key_name", S::string(OptionalComputed)),
        ("monitoring", S::bool(OptionalComputed)),
        ("outpost_arn", S::string(Computed)),
        ("password_data", S::string(Computed)),
        ("placement_group", S::string(OptionalComputed)),
        ("placement_partition_number", S::int(OptionalComputed)),
        ("primary_network_interface_id", S::string(Computed)),
        ("private_dns", S::string(Computed)),
        ("private_ip", S::string(OptionalComputed)),
        ("public_dns", S::string(Computed)),
        ("public_ip", S::string(Computed)),
        ("secondary_private_ips", string_set(OptionalComputed)),
        ("security_groups", string_set(OptionalComputed)),
        ("source_dest_check", S::bool(OptionalComputed)),
        ("spot_instance_request_id", S::string(Computed)),
        ("subnet_id", S::string(OptionalComputed)),
        ("tenancy", S::string(OptionalComputed)),
        ("user_data", S::string(OptionalComputed)),
        ("user_data_base64", S::string(OptionalComputed)),
        ("user_data_replace_on_change", S::bool(Optional)),
        ("vpc_security_group_ids", string_set(OptionalComputed)),
    ]);
    schema.insert("volume_tags".into(), string_map(OptionalComputed));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_type_is_defined() {
        let defined: Vec<String> = hand_authored()
            .into_iter()
            .map(|d| d.resource_type)
            .collect();
        assert_eq!(defined, HAND_AUTHORED_TYPES);
    }

    #[test]
    fn test_s3_bucket_force_destroy_is_plain_optional() {
        let bucket = s3_bucket();
        assert_eq!(bucket["force_destroy"].mutability, Optional);
        assert_eq!(bucket["arn"].mutability, Computed);
        assert_eq!(bucket["tags"].kind, Kind::Map);
    }

    #[test]
    fn test_nested_id_attributes_are_kept() {
        let bucket = s3_bucket();
        let grant = bucket["grant"].nested_children().unwrap();
        assert!(grant.contains_key("id"));
        let rule = bucket["lifecycle_rule"].nested_children().unwrap();
        assert_eq!(rule["id"].mutability, OptionalComputed);
    }

    #[test]
    fn test_singleton_blocks() {
        let bucket = s3_bucket();
        assert_eq!(bucket["versioning"].max_items(), Some(1));
        assert_eq!(bucket["cors_rule"].max_items(), None);

        let lock = bucket["object_lock_configuration"].nested_children().unwrap();
        let rule = lock["rule"].nested_children().unwrap();
        let retention = &rule["default_retention"];
        assert_eq!(retention.mutability, Required);
        assert_eq!(
            retention.cardinality,
            Some(Cardinality {
                min_items: Some(1),
                max_items: Some(1)
            })
        );
    }

    #[test]
    fn test_subnet_requires_vpc() {
        assert_eq!(subnet()["vpc_id"].mutability, Required);
        assert_eq!(security_group()["ingress"].kind, Kind::Set);
    }
}
