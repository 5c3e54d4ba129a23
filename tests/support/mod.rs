//! Shared builders for integration tests

#![allow(dead_code)]

use package_manager_controller::crd::{
    ActivationPolicy, Condition, ConditionStatus, Conditions, ImageConfig, ImageConfigSpec,
    ImageMatch, MatchType, Package, PackageRevision, PackageRevisionSpec, PackageRevisionStatus,
    PackageSpec, PullPolicy, RegistryAuthentication, RegistryConfig, RevisionDesiredState,
    RewriteImage, SecretRef,
};

pub fn package(name: &str, source: &str) -> Package {
    Package::new(
        name,
        PackageSpec {
            package: source.to_string(),
            package_pull_policy: PullPolicy::IfNotPresent,
            package_pull_secrets: Vec::new(),
            revision_activation_policy: ActivationPolicy::Automatic,
            revision_history_limit: None,
        },
    )
}

pub fn revision(name: &str, ordinal: i64, state: RevisionDesiredState) -> PackageRevision {
    PackageRevision::new(
        name,
        PackageRevisionSpec {
            desired_state: state,
            revision: ordinal,
            package_image: "registry.example.com/org/pkg:v1".to_string(),
            package_pull_policy: PullPolicy::IfNotPresent,
            package_pull_secrets: Vec::new(),
        },
    )
}

pub fn active(name: &str, ordinal: i64) -> PackageRevision {
    revision(name, ordinal, RevisionDesiredState::Active)
}

pub fn inactive(name: &str, ordinal: i64) -> PackageRevision {
    revision(name, ordinal, RevisionDesiredState::Inactive)
}

pub fn healthy(mut rev: PackageRevision, status: ConditionStatus) -> PackageRevision {
    let mut conditions = Conditions::default();
    conditions.set(Condition {
        r#type: "Healthy".to_string(),
        status,
        reason: "RevisionHealth".to_string(),
        message: None,
        last_transition_time: None,
    });
    rev.status = Some(PackageRevisionStatus { conditions });
    rev
}

pub fn image_config(
    name: &str,
    prefixes: &[&str],
    rewrite: Option<&str>,
    pull_secret: Option<&str>,
) -> ImageConfig {
    ImageConfig::new(
        name,
        ImageConfigSpec {
            match_images: prefixes
                .iter()
                .map(|prefix| ImageMatch {
                    r#type: MatchType::Prefix,
                    prefix: (*prefix).to_string(),
                })
                .collect(),
            rewrite_image: rewrite.map(|prefix| RewriteImage {
                prefix: prefix.to_string(),
            }),
            registry: pull_secret.map(|secret| RegistryConfig {
                authentication: Some(RegistryAuthentication {
                    pull_secret_ref: SecretRef {
                        name: secret.to_string(),
                    },
                }),
            }),
        },
    )
}
