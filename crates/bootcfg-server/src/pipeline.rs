//! Per-protocol request pipelines
//!
//! labels -> Group -> Profile -> template -> render -> encode. Each
//! pipeline returns a complete payload or an error; nothing partial is
//! ever produced.

use crate::context::RenderContext;
use crate::error::{BootcfgError, Result};
use crate::render::render_str;
use crate::server::Server;
use bootcfg_ipxe::{pixiecore_json, profile_script, BOOTSTRAP_SCRIPT};
use bootcfg_metadata::{FlatMetadata, UserData};
use bootcfg_model::{Group, Labels, MacAddr, Profile, TemplateNamespace, MAC_LABEL, UUID_LABEL};
use tracing::{debug, warn};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const PLAIN_CONTENT_TYPE: &str = "text/plain";

/// A response body and the content type to declare, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub body: String,
    pub content_type: Option<&'static str>,
}

impl Payload {
    pub fn json(body: String) -> Self {
        Self {
            body,
            content_type: Some(JSON_CONTENT_TYPE),
        }
    }

    pub fn plain(body: String) -> Self {
        Self {
            body,
            content_type: Some(PLAIN_CONTENT_TYPE),
        }
    }

    /// Body served without a declared content type
    pub fn untyped(body: String) -> Self {
        Self {
            body,
            content_type: None,
        }
    }
}

/// Script that chains iPXE back with the machine's labels
pub fn bootstrap() -> Payload {
    Payload::untyped(BOOTSTRAP_SCRIPT.to_string())
}

/// iPXE boot script for the matched Profile
pub fn ipxe(server: &Server, labels: &Labels) -> Result<Payload> {
    let profile = server.select_profile(labels)?;
    let script = profile_script(&profile).inspect_err(|e| {
        warn!(profile = %profile.id, error = %e, "cannot build iPXE script");
    })?;
    Ok(Payload::untyped(script))
}

/// Pixiecore boot document for the machine named by a MAC path segment
pub fn pixiecore(server: &Server, segment: &str, mut labels: Labels) -> Result<Payload> {
    let raw_path = format!("/{}", segment);
    let mac = MacAddr::parse(segment).map_err(|_| {
        debug!(path = %raw_path, "invalid MAC address");
        BootcfgError::InvalidMac(raw_path)
    })?;
    labels.insert(MAC_LABEL.to_string(), mac.to_string());

    let profile = server.select_profile(&labels)?;
    let json = pixiecore_json(&profile).inspect_err(|e| {
        warn!(profile = %profile.id, %mac, error = %e, "cannot build pixiecore document");
    })?;
    Ok(Payload::json(json))
}

/// Ignition config rendered from the Profile's template, served as JSON in
/// the version it declares
pub fn ignition(server: &Server, labels: &Labels) -> Result<Payload> {
    let (group, profile, rendered) = render_profile(server, labels, TemplateNamespace::Ignition)?;
    let config = bootcfg_ignition::parse(&rendered).inspect_err(|e| {
        warn!(group = %group.id, profile = %profile.id, error = %e, "invalid ignition config");
    })?;
    debug!(group = %group.id, profile = %profile.id, version = %config.version, "serving ignition");
    Ok(Payload::json(config.to_json()?))
}

/// Cloud-Config user-data; either a valid cloud-config or a script
pub fn cloud(server: &Server, labels: &Labels) -> Result<Payload> {
    let (group, profile, rendered) = render_profile(server, labels, TemplateNamespace::Cloud)?;
    let user_data = UserData::parse(rendered).inspect_err(|e| {
        warn!(group = %group.id, profile = %profile.id, error = %e, "invalid user-data");
    })?;
    Ok(Payload::untyped(user_data.into_string()))
}

/// Generic template output, unchecked
pub fn generic(server: &Server, labels: &Labels) -> Result<Payload> {
    let (_, _, rendered) = render_profile(server, labels, TemplateNamespace::Generic)?;
    Ok(Payload::untyped(rendered))
}

/// Group metadata and selectors as `KEY=value` lines, plus the request's
/// `uuid` label
pub fn metadata(server: &Server, labels: &Labels) -> Result<Payload> {
    let group = server.select_group(labels)?;
    let context = RenderContext::for_group(&group)?;

    let mut flat = FlatMetadata::from_document(context.as_metadata())?;
    if let Some(uuid) = labels.get(UUID_LABEL) {
        flat = flat.with_identifier(UUID_LABEL, uuid)?;
    }
    Ok(Payload::plain(flat.render()))
}

/// Select, resolve and render the Profile's template in `namespace`
fn render_profile(
    server: &Server,
    labels: &Labels,
    namespace: TemplateNamespace,
) -> Result<(Group, Profile, String)> {
    let group = server.select_group(labels)?;
    let profile = server.profile_for_group(&group)?;
    let template = server.profile_template(&profile, namespace)?;
    let name = profile.template_ref(namespace).unwrap_or(namespace.as_str());

    let rendered = RenderContext::for_group(&group)
        .and_then(|context| render_str(name, &template, &context, server.template_source()))
        .map_err(|e| {
            warn!(group = %group.id, profile = %profile.id, template = name, error = %e, "render failed");
            BootcfgError::from(e)
        })?;

    Ok((group, profile, rendered))
}
