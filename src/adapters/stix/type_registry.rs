//! Declared properties of the STIX 2.1 object types.

use crate::schema::{PropertyDeclaration, PropertyKind as K};

type Declared = &'static [(&'static str, K)];

pub const RELATIONSHIP_TYPE: &str = "relationship";

const SDO_HEAD: Declared = &[
    ("type", K::Type),
    ("spec_version", K::String),
    ("id", K::Id),
    ("created_by_ref", K::Reference),
    ("created", K::Timestamp),
    ("modified", K::Timestamp),
];

const SDO_TAIL: Declared = &[
    ("revoked", K::Boolean),
    ("labels", K::List),
    ("confidence", K::Integer),
    ("lang", K::String),
    ("external_references", K::List),
    ("object_marking_refs", K::List),
    ("granular_markings", K::List),
    ("extensions", K::Extensions),
];

const SCO_HEAD: Declared = &[("type", K::Type), ("spec_version", K::String), ("id", K::Id)];

const SCO_TAIL: Declared = &[
    ("object_marking_refs", K::List),
    ("granular_markings", K::List),
    ("defanged", K::Boolean),
    ("extensions", K::Extensions),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Domain,
    Cyber,
}

fn specific(type_tag: &str) -> Option<(Family, Declared)> {
    use Family::*;
    let declared: (Family, Declared) = match type_tag {
        "attack-pattern" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("aliases", K::List),
                ("kill_chain_phases", K::List),
            ],
        ),
        "campaign" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("aliases", K::List),
                ("first_seen", K::Timestamp),
                ("last_seen", K::Timestamp),
                ("objective", K::String),
            ],
        ),
        "course-of-action" | "vulnerability" => {
            (Domain, &[("name", K::String), ("description", K::String)])
        }
        "grouping" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("context", K::OpenVocab),
                ("object_refs", K::List),
            ],
        ),
        "identity" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("roles", K::List),
                ("identity_class", K::OpenVocab),
                ("sectors", K::List),
                ("contact_information", K::String),
            ],
        ),
        "incident" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("kill_chain_phases", K::List),
            ],
        ),
        "indicator" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("indicator_types", K::List),
                ("pattern", K::Pattern),
                ("pattern_type", K::OpenVocab),
                ("pattern_version", K::String),
                ("valid_from", K::Timestamp),
                ("valid_until", K::Timestamp),
                ("kill_chain_phases", K::List),
            ],
        ),
        "infrastructure" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("infrastructure_types", K::List),
                ("aliases", K::List),
                ("kill_chain_phases", K::List),
                ("first_seen", K::Timestamp),
                ("last_seen", K::Timestamp),
            ],
        ),
        "intrusion-set" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("aliases", K::List),
                ("first_seen", K::Timestamp),
                ("last_seen", K::Timestamp),
                ("goals", K::List),
                ("resource_level", K::OpenVocab),
                ("primary_motivation", K::OpenVocab),
                ("secondary_motivations", K::List),
            ],
        ),
        "location" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("latitude", K::Float),
                ("longitude", K::Float),
                ("precision", K::Float),
                ("region", K::OpenVocab),
                ("country", K::String),
                ("administrative_area", K::String),
                ("city", K::String),
                ("street_address", K::String),
                ("postal_code", K::String),
            ],
        ),
        "malware" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("malware_types", K::List),
                ("is_family", K::Boolean),
                ("aliases", K::List),
                ("kill_chain_phases", K::List),
                ("first_seen", K::Timestamp),
                ("last_seen", K::Timestamp),
                ("operating_system_refs", K::List),
                ("architecture_execution_envs", K::List),
                ("implementation_languages", K::List),
                ("capabilities", K::List),
                ("sample_refs", K::List),
            ],
        ),
        "malware-analysis" => (
            Domain,
            &[
                ("product", K::String),
                ("version", K::String),
                ("host_vm_ref", K::Reference),
                ("operating_system_ref", K::Reference),
                ("installed_software_refs", K::List),
                ("configuration_version", K::String),
                ("modules", K::List),
                ("analysis_engine_version", K::String),
                ("analysis_definition_version", K::String),
                ("submitted", K::Timestamp),
                ("analysis_started", K::Timestamp),
                ("analysis_ended", K::Timestamp),
                ("result_name", K::String),
                ("result", K::OpenVocab),
                ("analysis_sco_refs", K::List),
                ("sample_ref", K::Reference),
            ],
        ),
        "note" => (
            Domain,
            &[
                ("abstract", K::String),
                ("content", K::String),
                ("authors", K::List),
                ("object_refs", K::List),
            ],
        ),
        "observed-data" => (
            Domain,
            &[
                ("first_observed", K::Timestamp),
                ("last_observed", K::Timestamp),
                ("number_observed", K::Integer),
                ("objects", K::Dictionary),
                ("object_refs", K::List),
            ],
        ),
        "opinion" => (
            Domain,
            &[
                ("explanation", K::String),
                ("authors", K::List),
                ("opinion", K::Enum),
                ("object_refs", K::List),
            ],
        ),
        "report" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("report_types", K::List),
                ("published", K::Timestamp),
                ("object_refs", K::List),
            ],
        ),
        "threat-actor" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("threat_actor_types", K::List),
                ("aliases", K::List),
                ("first_seen", K::Timestamp),
                ("last_seen", K::Timestamp),
                ("roles", K::List),
                ("goals", K::List),
                ("sophistication", K::OpenVocab),
                ("resource_level", K::OpenVocab),
                ("primary_motivation", K::OpenVocab),
                ("secondary_motivations", K::List),
                ("personal_motivations", K::List),
            ],
        ),
        "tool" => (
            Domain,
            &[
                ("name", K::String),
                ("description", K::String),
                ("tool_types", K::List),
                ("aliases", K::List),
                ("kill_chain_phases", K::List),
                ("tool_version", K::String),
            ],
        ),
        "relationship" => (
            Domain,
            &[
                ("relationship_type", K::String),
                ("description", K::String),
                ("source_ref", K::Reference),
                ("target_ref", K::Reference),
                ("start_time", K::Timestamp),
                ("stop_time", K::Timestamp),
            ],
        ),
        "sighting" => (
            Domain,
            &[
                ("description", K::String),
                ("first_seen", K::Timestamp),
                ("last_seen", K::Timestamp),
                ("count", K::Integer),
                ("sighting_of_ref", K::Reference),
                ("observed_data_refs", K::List),
                ("where_sighted_refs", K::List),
                ("summary", K::Boolean),
            ],
        ),
        "artifact" => (
            Cyber,
            &[
                ("mime_type", K::String),
                ("payload_bin", K::Binary),
                ("url", K::String),
                ("hashes", K::Hashes),
                ("encryption_algorithm", K::Enum),
                ("decryption_key", K::String),
            ],
        ),
        "autonomous-system" => (
            Cyber,
            &[("number", K::Integer), ("name", K::String), ("rir", K::String)],
        ),
        "directory" => (
            Cyber,
            &[
                ("path", K::String),
                ("path_enc", K::String),
                ("ctime", K::Timestamp),
                ("mtime", K::Timestamp),
                ("atime", K::Timestamp),
                ("contains_refs", K::List),
            ],
        ),
        "domain-name" => (Cyber, &[("value", K::String), ("resolves_to_refs", K::List)]),
        "email-addr" => (
            Cyber,
            &[
                ("value", K::String),
                ("display_name", K::String),
                ("belongs_to_ref", K::Reference),
            ],
        ),
        "email-message" => (
            Cyber,
            &[
                ("is_multipart", K::Boolean),
                ("date", K::Timestamp),
                ("content_type", K::String),
                ("from_ref", K::Reference),
                ("sender_ref", K::Reference),
                ("to_refs", K::List),
                ("cc_refs", K::List),
                ("bcc_refs", K::List),
                ("message_id", K::String),
                ("subject", K::String),
                ("received_lines", K::List),
                ("additional_header_fields", K::Dictionary),
                ("body", K::String),
                ("body_multipart", K::List),
                ("raw_email_ref", K::Reference),
            ],
        ),
        "file" => (
            Cyber,
            &[
                ("hashes", K::Hashes),
                ("size", K::Integer),
                ("name", K::String),
                ("name_enc", K::String),
                ("magic_number_hex", K::Hex),
                ("mime_type", K::String),
                ("ctime", K::Timestamp),
                ("mtime", K::Timestamp),
                ("atime", K::Timestamp),
                ("parent_directory_ref", K::Reference),
                ("contains_refs", K::List),
                ("content_ref", K::Reference),
            ],
        ),
        "ipv4-addr" | "ipv6-addr" => (
            Cyber,
            &[
                ("value", K::String),
                ("resolves_to_refs", K::List),
                ("belongs_to_refs", K::List),
            ],
        ),
        "mac-addr" | "url" => (Cyber, &[("value", K::String)]),
        "mutex" => (Cyber, &[("name", K::String)]),
        "network-traffic" => (
            Cyber,
            &[
                ("start", K::Timestamp),
                ("end", K::Timestamp),
                ("is_active", K::Boolean),
                ("src_ref", K::Reference),
                ("dst_ref", K::Reference),
                ("src_port", K::Integer),
                ("dst_port", K::Integer),
                ("protocols", K::List),
                ("src_byte_count", K::Integer),
                ("dst_byte_count", K::Integer),
                ("src_packets", K::Integer),
                ("dst_packets", K::Integer),
                ("ipfix", K::Dictionary),
                ("src_payload_ref", K::Reference),
                ("dst_payload_ref", K::Reference),
                ("encapsulates_refs", K::List),
                ("encapsulated_by_ref", K::Reference),
            ],
        ),
        "process" => (
            Cyber,
            &[
                ("is_hidden", K::Boolean),
                ("pid", K::Integer),
                ("created_time", K::Timestamp),
                ("cwd", K::String),
                ("command_line", K::String),
                ("environment_variables", K::Dictionary),
                ("opened_connection_refs", K::List),
                ("creator_user_ref", K::Reference),
                ("image_ref", K::Reference),
                ("parent_ref", K::Reference),
                ("child_refs", K::List),
            ],
        ),
        "software" => (
            Cyber,
            &[
                ("name", K::String),
                ("cpe", K::String),
                ("swid", K::String),
                ("languages", K::List),
                ("vendor", K::String),
                ("version", K::String),
            ],
        ),
        "user-account" => (
            Cyber,
            &[
                ("user_id", K::String),
                ("credential", K::String),
                ("account_login", K::String),
                ("account_type", K::OpenVocab),
                ("display_name", K::String),
                ("is_service_account", K::Boolean),
                ("is_privileged", K::Boolean),
                ("can_escalate_privs", K::Boolean),
                ("is_disabled", K::Boolean),
                ("account_created", K::Timestamp),
                ("account_expires", K::Timestamp),
                ("credential_last_changed", K::Timestamp),
                ("account_first_login", K::Timestamp),
                ("account_last_login", K::Timestamp),
            ],
        ),
        "windows-registry-key" => (
            Cyber,
            &[
                ("key", K::String),
                ("values", K::List),
                ("modified_time", K::Timestamp),
                ("creator_user_ref", K::Reference),
                ("number_of_subkeys", K::Integer),
            ],
        ),
        "x509-certificate" => (
            Cyber,
            &[
                ("is_self_signed", K::Boolean),
                ("hashes", K::Hashes),
                ("version", K::String),
                ("serial_number", K::String),
                ("signature_algorithm", K::String),
                ("issuer", K::String),
                ("validity_not_before", K::Timestamp),
                ("validity_not_after", K::Timestamp),
                ("subject", K::String),
                ("subject_public_key_algorithm", K::String),
                ("subject_public_key_modulus", K::String),
                ("subject_public_key_exponent", K::Integer),
            ],
        ),
        _ => return None,
    };
    Some(declared)
}

pub fn is_registered(type_tag: &str) -> bool {
    specific(type_tag).is_some()
}

/// Declared properties of `type_tag` in declaration order. Unregistered types get the
/// common properties of domain objects.
pub fn declared_properties(type_tag: &str) -> Vec<PropertyDeclaration> {
    let (head, body, tail) = match specific(type_tag) {
        Some((Family::Domain, body)) => (SDO_HEAD, body, SDO_TAIL),
        Some((Family::Cyber, body)) => (SCO_HEAD, body, SCO_TAIL),
        None => (SDO_HEAD, &[] as Declared, SDO_TAIL),
    };
    head.iter()
        .chain(body)
        .chain(tail)
        .map(|(name, kind)| PropertyDeclaration::new(*name, *kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(type_tag: &str) -> Vec<String> {
        declared_properties(type_tag)
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[test]
    fn test_common_properties_frame_specific_ones() {
        let identity = names("identity");
        assert_eq!(&identity[..6], &["type", "spec_version", "id", "created_by_ref", "created", "modified"]);
        assert_eq!(identity[6], "name");
        assert_eq!(identity.last().unwrap(), "extensions");

        let url = names("url");
        assert_eq!(url, vec!["type", "spec_version", "id", "value", "object_marking_refs", "granular_markings", "defanged", "extensions"]);
    }

    #[test]
    fn test_unregistered_type_gets_common_properties() {
        assert!(!is_registered("x-acme-widget"));
        assert_eq!(names("x-acme-widget").len(), SDO_HEAD.len() + SDO_TAIL.len());
        assert!(is_registered(RELATIONSHIP_TYPE));
    }
}
