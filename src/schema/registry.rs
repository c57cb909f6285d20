//! Endpoint registry and the built-in Snyk catalogue

use super::types::{EndpointSchema, FieldSpec};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::LazyLock;

const ISSUE_TYPES: &[&str] = &[
    "package_vulnerability",
    "license",
    "cloud",
    "code",
    "custom",
    "config",
];

const SCAN_ITEM_TYPES: &[&str] = &["project", "environment"];

/// Built-in endpoint definitions
pub static BUILTIN_ENDPOINTS: LazyLock<Vec<EndpointSchema>> = LazyLock::new(|| {
    let mut endpoints = rest_endpoints();
    endpoints.extend(v1_endpoints());
    endpoints
});

fn issue_fields(owner: &str, other: &str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("id"),
        FieldSpec::belongs_to(format!("{owner}_id"), format!("{owner}s")).searchable(),
        FieldSpec::string(format!("{other}_id")),
        FieldSpec::string("project_id"),
        FieldSpec::string("environment_id"),
        FieldSpec::datetime("created_at"),
        FieldSpec::datetime("updated_at"),
        FieldSpec::string("description"),
        FieldSpec::json("coordinates"),
        FieldSpec::json("classes"),
        FieldSpec::string("effective_severity_level"),
        FieldSpec::boolean("ignored"),
        FieldSpec::string("key"),
        FieldSpec::json("problems"),
        FieldSpec::json("risk"),
        FieldSpec::string("status"),
        FieldSpec::string("title"),
        FieldSpec::string("tool"),
        FieldSpec::json("resolution"),
        FieldSpec::select("issue_type", ISSUE_TYPES),
        FieldSpec::string("scan_item_id").searchable(),
        FieldSpec::select("scan_item_type", SCAN_ITEM_TYPES).searchable(),
        FieldSpec::datetime("created_before").searchable().temporary(),
        FieldSpec::datetime("created_after").searchable().temporary(),
        FieldSpec::datetime("updated_before").searchable().temporary(),
        FieldSpec::datetime("updated_after").searchable().temporary(),
    ]
}

#[allow(clippy::too_many_lines)]
fn rest_endpoints() -> Vec<EndpointSchema> {
    vec![
        EndpointSchema::rest("orgs", "orgs").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("group_id", "groups").searchable(),
            FieldSpec::string("name").searchable().range(),
            FieldSpec::string("slug").searchable(),
            FieldSpec::boolean("is_personal").searchable(),
        ]),
        EndpointSchema::rest("projects", "orgs/{org_id}/projects")
            .with_rename("type", "project_type")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::belongs_to("org_id", "orgs").searchable(),
                FieldSpec::string("group_id").searchable(),
                FieldSpec::string("name").searchable(),
                FieldSpec::string("origin"),
                FieldSpec::string("origins").searchable().temporary(),
                FieldSpec::string("project_type"),
                FieldSpec::string("types").searchable().temporary(),
                FieldSpec::json("build_args"),
                FieldSpec::datetime("created"),
                FieldSpec::select(
                    "business_criticality",
                    &["critical", "high", "medium", "low"],
                ),
                FieldSpec::select(
                    "environment",
                    &["frontend", "backend", "internal", "external", "mobile", "saas", "onprem", "hosted", "distributed"],
                ),
                FieldSpec::select("lifecycle", &["production", "development", "sandbox"]),
                FieldSpec::boolean("read_only"),
                FieldSpec::json("settings"),
                FieldSpec::select("status", &["active", "inactive"]),
                FieldSpec::json("tags"),
                FieldSpec::string("target_file").searchable(),
                FieldSpec::string("target_reference").searchable(),
                FieldSpec::string("target_runtime"),
                FieldSpec::string("importer_id"),
                FieldSpec::string("owner_id"),
                FieldSpec::belongs_to("target_id", "targets").searchable(),
            ]),
        EndpointSchema::rest("targets", "orgs/{org_id}/targets").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("org_id", "orgs").searchable(),
            FieldSpec::string("display_name").searchable().range(),
            FieldSpec::string("url").searchable(),
            FieldSpec::boolean("is_private").searchable(),
            FieldSpec::string("origin"),
            FieldSpec::datetime("created_at").searchable().range(),
        ]),
        EndpointSchema::rest("issues", "orgs/{org_id}/issues")
            .with_rename("type", "issue_type")
            .with_rename("scan_item.id", "scan_item_id")
            .with_rename("scan_item.type", "scan_item_type")
            .with_fields(issue_fields("org", "group")),
        EndpointSchema::rest("group_issues", "groups/{group_id}/issues")
            .with_rename("type", "issue_type")
            .with_rename("scan_item.id", "scan_item_id")
            .with_rename("scan_item.type", "scan_item_type")
            .with_fields(issue_fields("group", "org")),
        EndpointSchema::rest("groups", "groups").with_fields([
            FieldSpec::string("id"),
            FieldSpec::string("name").searchable().range(),
        ]),
        EndpointSchema::rest("group_memberships", "groups/{group_id}/memberships")
            .with_rename("type", "membership_type")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::belongs_to("group_id", "groups").searchable(),
                FieldSpec::json("user"),
                FieldSpec::json("role"),
                FieldSpec::string("membership_type"),
                FieldSpec::string("user_id"),
                FieldSpec::string("role_id"),
                FieldSpec::boolean("include_group_membership_count")
                    .searchable()
                    .temporary(),
            ]),
        EndpointSchema::rest("org_memberships", "orgs/{org_id}/memberships")
            .with_rename("type", "membership_type")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("group_id"),
                FieldSpec::belongs_to("org_id", "orgs").searchable(),
                FieldSpec::string("membership_type"),
                FieldSpec::string("user_id"),
                FieldSpec::string("role_id"),
                FieldSpec::json("user"),
                FieldSpec::json("role"),
                FieldSpec::datetime("created_at"),
            ]),
        EndpointSchema::rest("tenants", "tenants").with_fields([
            FieldSpec::string("id"),
            FieldSpec::string("name").searchable().range(),
            FieldSpec::string("slug"),
            FieldSpec::datetime("created_at"),
            FieldSpec::datetime("updated_at"),
        ]),
        EndpointSchema::rest("tenant_memberships", "tenants/{tenant_id}/memberships").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("tenant_id", "tenants").searchable(),
            FieldSpec::datetime("created_at"),
            FieldSpec::json("role"),
            FieldSpec::json("user"),
        ]),
        EndpointSchema::rest("tenant_roles", "tenants/{tenant_id}/roles").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("tenant_id", "tenants").searchable(),
            FieldSpec::string("name").searchable(),
            FieldSpec::string("description"),
            FieldSpec::datetime("created"),
            FieldSpec::datetime("modified"),
        ]),
        EndpointSchema::rest("audit_logs", "orgs/{org_id}/audit_logs/search").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("org_id", "orgs").searchable(),
            FieldSpec::string("event").searchable(),
            FieldSpec::datetime("created"),
            FieldSpec::string("group_id"),
            FieldSpec::string("project_id").searchable(),
            FieldSpec::string("user_id").searchable(),
            FieldSpec::json("content"),
            FieldSpec::datetime("from").searchable().temporary(),
            FieldSpec::datetime("to").searchable().temporary(),
        ]),
        EndpointSchema::rest("policies", "orgs/{org_id}/policies").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("org_id", "orgs").searchable(),
            FieldSpec::string("name").searchable().range(),
            FieldSpec::select("action_type", &["ignore"]),
            FieldSpec::json("action"),
            FieldSpec::json("conditions_group"),
            FieldSpec::select("review", &["pending", "approved", "rejected"]),
            FieldSpec::datetime("created_at"),
            FieldSpec::datetime("updated_at"),
            FieldSpec::json("created_by"),
        ]),
        EndpointSchema::rest("service_accounts", "orgs/{org_id}/service_accounts").with_fields([
            FieldSpec::string("id"),
            FieldSpec::string("group_id"),
            FieldSpec::belongs_to("org_id", "orgs").searchable(),
            FieldSpec::select("auth_type", &["api_key", "oauth_client_secret", "oauth_private_key_jwt"]),
            FieldSpec::string("name"),
            FieldSpec::string("role_id"),
            FieldSpec::string("client_id"),
            FieldSpec::string("jwks_url"),
            FieldSpec::select("level", &["org", "group"]),
            FieldSpec::integer("access_token_ttl_seconds"),
            FieldSpec::datetime("created_at"),
        ]),
        EndpointSchema::rest("invites", "orgs/{org_id}/invites").with_fields([
            FieldSpec::string("id"),
            FieldSpec::belongs_to("org_id", "orgs").searchable(),
            FieldSpec::email("email"),
            FieldSpec::string("role"),
            FieldSpec::boolean("is_active"),
        ]),
        EndpointSchema::rest("collections", "orgs/{org_id}/collections")
            .with_rename("type", "collection_type")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("collection_type"),
                FieldSpec::string("name").searchable().range(),
                FieldSpec::boolean("is_generated").searchable(),
                FieldSpec::json("meta"),
                FieldSpec::belongs_to("org_id", "orgs").searchable(),
            ]),
        EndpointSchema::rest("container_images", "orgs/{org_id}/container_images")
            .with_rename("type", "resource_type")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::select("resource_type", &["container_image"]),
                FieldSpec::string("platform").searchable(),
                FieldSpec::json("names").searchable(),
                FieldSpec::json("image_target_refs"),
                FieldSpec::belongs_to("org_id", "orgs").searchable(),
            ]),
        EndpointSchema::rest("self", "self").with_fields([
            FieldSpec::string("id"),
            FieldSpec::select("principal_type", &["user", "service_account", "app_instance"]),
            FieldSpec::string("name"),
            FieldSpec::email("email"),
            FieldSpec::string("username"),
            FieldSpec::string("avatar_url"),
            FieldSpec::string("default_org_context"),
        ]),
    ]
}

fn v1_endpoints() -> Vec<EndpointSchema> {
    vec![
        EndpointSchema::v1("v1_orgs", "orgs")
            .with_records_key("orgs")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("name"),
                FieldSpec::string("slug"),
                FieldSpec::string("url"),
                FieldSpec::json("group"),
            ]),
        EndpointSchema::v1("webhooks", "org/{org_id}/webhooks")
            .with_records_key("results")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("org_id").searchable(),
                FieldSpec::string("url"),
                FieldSpec::string("secret"),
            ]),
        EndpointSchema::v1("entitlements", "org/{org_id}/entitlements")
            .with_id_field("name")
            .with_fields([
                FieldSpec::string("name"),
                FieldSpec::string("org_id").searchable(),
                FieldSpec::boolean("value"),
            ]),
        EndpointSchema::v1("integrations", "org/{org_id}/integrations")
            .with_rename("type", "integration_type")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("org_id").searchable(),
                FieldSpec::string("integration_type"),
                FieldSpec::json("credentials"),
            ]),
        EndpointSchema::v1("project_history", "org/{org_id}/project/{project_id}/history")
            .with_records_key("snapshots")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("org_id").searchable(),
                FieldSpec::string("project_id").searchable(),
                FieldSpec::datetime("created"),
                FieldSpec::integer("total_dependencies"),
                FieldSpec::json("issue_counts"),
                FieldSpec::string("image_id"),
                FieldSpec::string("image_tag"),
                FieldSpec::string("base_image_name"),
                FieldSpec::string("method"),
            ]),
        EndpointSchema::v1("group_tags", "group/{group_id}/tags")
            .with_records_key("tags")
            .with_fields([
                FieldSpec::string("id"),
                FieldSpec::string("group_id").searchable(),
                FieldSpec::string("key"),
                FieldSpec::string("value"),
            ]),
        EndpointSchema::v1("group_roles", "group/{group_id}/roles")
            .with_id_field("public_id")
            .with_fields([
                FieldSpec::string("public_id"),
                FieldSpec::string("group_id").searchable(),
                FieldSpec::string("name"),
                FieldSpec::string("description"),
                FieldSpec::string("created"),
                FieldSpec::string("modified"),
            ]),
        EndpointSchema::v1("group_settings", "group/{group_id}/settings")
            .with_id_field("group_id")
            .with_fields([
                FieldSpec::string("group_id").searchable(),
                FieldSpec::integer("session_length"),
                FieldSpec::json("request_access"),
                FieldSpec::boolean("request_access_enabled"),
            ]),
    ]
}

/// Registry of endpoint schemas, keyed by name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    endpoints: HashMap<String, EndpointSchema>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in Snyk endpoints
    pub fn builtin() -> Self {
        let endpoints = BUILTIN_ENDPOINTS
            .iter()
            .map(|e| (e.name.clone(), e.clone()))
            .collect();
        Self { endpoints }
    }

    /// Add or replace an endpoint
    pub fn register(&mut self, schema: EndpointSchema) -> Result<()> {
        schema.validate()?;
        if self.endpoints.contains_key(&schema.name) {
            tracing::debug!(endpoint = %schema.name, "Replacing registered endpoint");
        }
        self.endpoints.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Get an endpoint by name
    pub fn get(&self, name: &str) -> Result<&EndpointSchema> {
        self.endpoints
            .get(name)
            .ok_or_else(|| Error::unknown_endpoint(name))
    }

    /// Check if an endpoint is registered
    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Registered endpoint names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
