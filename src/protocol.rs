//! Messages crossing the isolation boundary between the console and the host.
//!
//! Both directions are closed tagged unions discriminated by `type`. The wire
//! names live in [`wire`]; a test verifies serde produces exactly those tags.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire names of every message `type`.
pub mod wire {
    pub const GET_SELECTION: &str = "get-selection";
    pub const CREATE_SHAPE: &str = "create-shape";
    pub const GET_ANALYTICS: &str = "get-analytics";
    pub const GET_USER_INFO: &str = "get-user-info";
    pub const GET_LS_DATA: &str = "get-ls-data";
    pub const CLOSE_PLUGIN: &str = "close-plugin";

    pub const SELECTION_DATA: &str = "selection-data";
    pub const SHAPE_CREATED: &str = "shape-created";
    pub const ANALYTICS_DATA: &str = "analytics-data";
    pub const USER_INFO: &str = "user-info";
    pub const LS_DATA: &str = "ls-data";
    pub const ERROR: &str = "error";
}

/// Host message accompanying a `user-info` reply without a user.
pub const OFFLINE_MESSAGE: &str = "User information not available. You may be working offline.";

// ── Payload types ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rect,
    Circle,
    Ellipse,
    Polygon,
    Star,
}

impl ShapeType {
    pub fn all() -> &'static [ShapeType] {
        &[
            Self::Rect,
            Self::Circle,
            Self::Ellipse,
            Self::Polygon,
            Self::Star,
        ]
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Polygon => "polygon",
            Self::Star => "star",
        }
    }

    pub fn from_slug(s: &str) -> Option<ShapeType> {
        Self::all().iter().copied().find(|t| t.slug() == s)
    }
}

/// Geometry of a shape to create. Absent fields fall back to host defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ShapeSpec {
    pub shape_type: ShapeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sides: Option<u32>,
    /// For stars: ratio of inner to outer radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<f64>,
}

impl ShapeSpec {
    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            width: None,
            height: None,
            x: None,
            y: None,
            radius: None,
            sides: None,
            inner_radius: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum LsSubCommand {
    Fonts,
    Styles,
    Components,
    Help,
}

impl LsSubCommand {
    pub fn all() -> &'static [LsSubCommand] {
        &[Self::Fonts, Self::Styles, Self::Components, Self::Help]
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Fonts => "fonts",
            Self::Styles => "styles",
            Self::Components => "components",
            Self::Help => "help",
        }
    }

    pub fn from_slug(s: &str) -> Option<LsSubCommand> {
        Self::all().iter().copied().find(|c| c.slug() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct NodeRef {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct FontName {
    pub family: String,
    pub style: String,
}

/// One selected node as reported by the host. The trailing optional fields are
/// only populated for verbose selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub parent: Option<NodeRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-bindings", ts(type = "Array<unknown> | null"))]
    pub children: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-bindings", ts(type = "unknown"))]
    pub constraints: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-bindings", ts(type = "Array<unknown> | null"))]
    pub fills: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-bindings", ts(type = "Array<unknown> | null"))]
    pub strokes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_component: Option<NodeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-bindings", ts(type = "unknown"))]
    pub variant_properties: Option<Value>,
}

impl NodeSummary {
    /// A node with only the base properties set.
    pub fn basic(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            visible: true,
            locked: false,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            opacity: Some(1.0),
            parent: None,
            children: None,
            layout_mode: None,
            constraints: None,
            font_name: None,
            font_size: None,
            characters: None,
            fills: None,
            strokes: None,
            corner_radius: None,
            point_count: None,
            inner_radius: None,
            main_component: None,
            variant_properties: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ── Requests (console → host) ───────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum HostRequest {
    GetSelection {
        #[serde(default)]
        verbose: bool,
    },
    CreateShape(ShapeSpec),
    GetAnalytics,
    GetUserInfo,
    GetLsData {
        sub_command: LsSubCommand,
        #[serde(default)]
        list_current: bool,
    },
    ClosePlugin,
}

impl HostRequest {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GetSelection { .. } => wire::GET_SELECTION,
            Self::CreateShape(_) => wire::CREATE_SHAPE,
            Self::GetAnalytics => wire::GET_ANALYTICS,
            Self::GetUserInfo => wire::GET_USER_INFO,
            Self::GetLsData { .. } => wire::GET_LS_DATA,
            Self::ClosePlugin => wire::CLOSE_PLUGIN,
        }
    }
}

// ── Replies (host → console) ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum HostReply {
    SelectionData {
        data: Vec<NodeSummary>,
    },
    ShapeCreated {
        shape_type: ShapeType,
        id: String,
    },
    AnalyticsData {
        total_pages: u64,
        total_layers_in_document: u64,
        total_layers_in_current_page: u64,
    },
    UserInfo {
        user: Option<UserSummary>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    LsData {
        data: String,
        sub_command: LsSubCommand,
    },
    Error {
        context: String,
        message: String,
    },
    /// Any tag this console does not know. Never matches a listener.
    #[serde(other)]
    Unknown,
}

/// Payload-free discriminant of [`HostReply`]; the only correlation key the
/// protocol offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    SelectionData,
    ShapeCreated,
    AnalyticsData,
    UserInfo,
    LsData,
    Error,
}

impl ReplyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelectionData => wire::SELECTION_DATA,
            Self::ShapeCreated => wire::SHAPE_CREATED,
            Self::AnalyticsData => wire::ANALYTICS_DATA,
            Self::UserInfo => wire::USER_INFO,
            Self::LsData => wire::LS_DATA,
            Self::Error => wire::ERROR,
        }
    }
}

impl HostReply {
    pub fn kind(&self) -> Option<ReplyKind> {
        match self {
            Self::SelectionData { .. } => Some(ReplyKind::SelectionData),
            Self::ShapeCreated { .. } => Some(ReplyKind::ShapeCreated),
            Self::AnalyticsData { .. } => Some(ReplyKind::AnalyticsData),
            Self::UserInfo { .. } => Some(ReplyKind::UserInfo),
            Self::LsData { .. } => Some(ReplyKind::LsData),
            Self::Error { .. } => Some(ReplyKind::Error),
            Self::Unknown => None,
        }
    }

    pub fn is(&self, kind: ReplyKind) -> bool {
        self.kind() == Some(kind)
    }
}

/// Outer wrapper used on the wire, mirroring the host's `pluginMessage` framing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "pluginMessage")]
    pub plugin_message: T,
}

impl<T> Envelope<T> {
    pub fn new(plugin_message: T) -> Self {
        Self { plugin_message }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn tag_of<T: Serialize>(msg: &T) -> String {
        serde_json::to_value(msg).unwrap()["type"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Every request variant serializes with the tag declared in `wire`.
    #[test]
    fn request_tags_match_wire_names() {
        let requests = [
            HostRequest::GetSelection { verbose: false },
            HostRequest::CreateShape(ShapeSpec::new(ShapeType::Rect)),
            HostRequest::GetAnalytics,
            HostRequest::GetUserInfo,
            HostRequest::GetLsData {
                sub_command: LsSubCommand::Fonts,
                list_current: false,
            },
            HostRequest::ClosePlugin,
        ];
        for req in &requests {
            assert_eq!(tag_of(req), req.type_name());
        }
    }

    #[test]
    fn reply_tags_match_wire_names() {
        let replies = [
            HostReply::SelectionData { data: vec![] },
            HostReply::ShapeCreated {
                shape_type: ShapeType::Star,
                id: "1:2".into(),
            },
            HostReply::AnalyticsData {
                total_pages: 1,
                total_layers_in_document: 2,
                total_layers_in_current_page: 3,
            },
            HostReply::UserInfo {
                user: None,
                message: None,
            },
            HostReply::LsData {
                data: String::new(),
                sub_command: LsSubCommand::Help,
            },
            HostReply::Error {
                context: "c".into(),
                message: "m".into(),
            },
        ];
        for reply in &replies {
            let kind = reply.kind().expect("known reply");
            assert_eq!(tag_of(reply), kind.as_str());
        }
    }

    #[test]
    fn create_shape_payload_is_flat_and_camel_cased() {
        let mut spec = ShapeSpec::new(ShapeType::Star);
        spec.sides = Some(5);
        spec.radius = Some(50.0);
        spec.inner_radius = Some(0.5);
        let value = serde_json::to_value(HostRequest::CreateShape(spec)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "create-shape",
                "shapeType": "star",
                "radius": 50.0,
                "sides": 5,
                "innerRadius": 0.5
            })
        );
    }

    #[test]
    fn unknown_reply_type_decodes_to_unknown() {
        let reply: HostReply =
            serde_json::from_value(serde_json::json!({ "type": "theme-changed", "dark": true }))
                .unwrap();
        assert_eq!(reply, HostReply::Unknown);
        assert_eq!(reply.kind(), None);
    }

    #[test]
    fn analytics_reply_reads_host_field_names() {
        let reply: HostReply = serde_json::from_value(serde_json::json!({
            "type": "analytics-data",
            "totalPages": 3,
            "totalLayersInDocument": 120,
            "totalLayersInCurrentPage": 40
        }))
        .unwrap();
        assert_eq!(
            reply,
            HostReply::AnalyticsData {
                total_pages: 3,
                total_layers_in_document: 120,
                total_layers_in_current_page: 40,
            }
        );
    }

    #[test]
    fn offline_user_decodes_null() {
        let reply: HostReply = serde_json::from_value(serde_json::json!({
            "type": "user-info",
            "user": null,
            "message": "offline"
        }))
        .unwrap();
        assert!(matches!(reply, HostReply::UserInfo { user: None, .. }));
    }

    #[test]
    fn selection_node_tolerates_missing_verbose_fields() {
        let node: NodeSummary = serde_json::from_value(serde_json::json!({
            "id": "1:1", "name": "Frame", "type": "FRAME",
            "visible": true, "locked": false, "x": 0, "y": 0,
            "width": 10, "height": 20, "rotation": 0, "opacity": 1,
            "parent": { "id": "0:1", "name": "Page 1", "type": "PAGE" }
        }))
        .unwrap();
        assert_eq!(node.node_type, "FRAME");
        assert!(node.children.is_none());
        assert_eq!(node.parent.unwrap().name, "Page 1");
    }

    #[test]
    fn envelope_wraps_in_plugin_message() {
        let value = serde_json::to_value(Envelope::new(HostRequest::GetAnalytics)).unwrap();
        assert_eq!(value["pluginMessage"]["type"], "get-analytics");
    }
}
