//! In-memory stand-in for the design tool: a small document plus a host loop
//! that answers console requests over the bus.

use std::time::Duration;

use indexmap::IndexSet;
use serde_json::{json, Value};

use crate::bus::HostEndpoint;
use crate::protocol::{
    FontName, HostReply, HostRequest, LsSubCommand, NodeRef, NodeSummary, ShapeSpec, ShapeType,
    UserSummary, OFFLINE_MESSAGE,
};

/// How long the host lets page loading run before answering analytics with an error.
pub const ANALYTICS_LIMIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct DemoNode {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub visible: bool,
    pub locked: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub fills: usize,
    pub strokes: usize,
    pub layout_mode: Option<String>,
    pub font: Option<FontName>,
    pub font_size: Option<f64>,
    pub characters: Option<String>,
    /// Name of the text style applied, if any.
    pub text_style: Option<String>,
    pub corner_radius: Option<f64>,
    pub point_count: Option<u32>,
    pub inner_radius: Option<f64>,
    pub main_component: Option<String>,
    pub variant_properties: Option<Value>,
    pub children: Vec<DemoNode>,
}

impl DemoNode {
    pub fn new(id: &str, name: &str, node_type: &str, rect: (f64, f64, f64, f64)) -> Self {
        let (x, y, width, height) = rect;
        Self {
            id: id.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            visible: true,
            opacity: 1.0,
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn text(
        id: &str,
        name: &str,
        family: &str,
        style: &str,
        size: f64,
        characters: &str,
    ) -> Self {
        Self {
            font: Some(FontName {
                family: family.to_string(),
                style: style.to_string(),
            }),
            font_size: Some(size),
            characters: Some(characters.to_string()),
            ..Self::new(id, name, "TEXT", (0.0, 0.0, 200.0, size * 1.5))
        }
    }

    pub fn with_children(mut self, children: Vec<DemoNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_text_style(mut self, style: &str) -> Self {
        self.text_style = Some(style.to_string());
        self
    }

    fn node_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id.clone(),
            name: self.name.clone(),
            node_type: self.node_type.clone(),
        }
    }

    /// This node and all of its descendants, depth first.
    fn walk<'a>(&'a self, out: &mut Vec<&'a DemoNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }

    fn summary(&self, parent: NodeRef, verbose: bool) -> NodeSummary {
        let mut s = NodeSummary::basic(&self.id, &self.name, &self.node_type);
        s.visible = self.visible;
        s.locked = self.locked;
        s.x = self.x;
        s.y = self.y;
        s.width = self.width;
        s.height = self.height;
        s.rotation = self.rotation;
        s.opacity = Some(self.opacity);
        s.parent = Some(parent);
        if !verbose {
            return s;
        }
        match self.node_type.as_str() {
            "FRAME" | "GROUP" => {
                s.children = Some(self.children.iter().map(|c| json!(c.id)).collect());
                if self.node_type == "FRAME" {
                    s.layout_mode = Some(self.layout_mode.clone().unwrap_or_else(|| "NONE".into()));
                    s.constraints = Some(json!({"horizontal": "MIN", "vertical": "MIN"}));
                }
            }
            "TEXT" => {
                s.font_name.clone_from(&self.font);
                s.font_size = self.font_size;
                s.characters.clone_from(&self.characters);
            }
            "RECTANGLE" | "ELLIPSE" | "POLYGON" | "STAR" => {
                s.fills = Some(vec![json!({"type": "SOLID"}); self.fills]);
                s.strokes = Some(vec![json!({"type": "SOLID"}); self.strokes]);
                s.corner_radius = self.corner_radius;
                s.point_count = self.point_count;
                s.inner_radius = self.inner_radius;
            }
            "INSTANCE" => {
                s.main_component = self.main_component.as_ref().map(|name| NodeRef {
                    id: String::new(),
                    name: name.clone(),
                    node_type: "COMPONENT".into(),
                });
                s.variant_properties.clone_from(&self.variant_properties);
            }
            _ => {}
        }
        s
    }
}

#[derive(Debug, Clone)]
pub struct DemoPage {
    pub id: String,
    pub name: String,
    /// Section separators in the page list; never counted or searched.
    pub is_section: bool,
    pub nodes: Vec<DemoNode>,
}

impl DemoPage {
    pub fn new(id: &str, name: &str, nodes: Vec<DemoNode>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            is_section: false,
            nodes,
        }
    }

    fn all_nodes(&self) -> Vec<&DemoNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.walk(&mut out);
        }
        out
    }

    fn node_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id.clone(),
            name: self.name.clone(),
            node_type: "PAGE".into(),
        }
    }

    /// Node with `id` and a reference to its parent (the page for top-level nodes).
    fn find(&self, id: &str) -> Option<(&DemoNode, NodeRef)> {
        fn search<'a>(
            nodes: &'a [DemoNode],
            parent: &NodeRef,
            id: &str,
        ) -> Option<(&'a DemoNode, NodeRef)> {
            for node in nodes {
                if node.id == id {
                    return Some((node, parent.clone()));
                }
                if let Some(hit) = search(&node.children, &node.node_ref(), id) {
                    return Some(hit);
                }
            }
            None
        }
        search(&self.nodes, &self.node_ref(), id)
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub name: String,
    pub font: FontName,
}

/// What the host does with one request.
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    Reply(HostReply),
    Close,
}

#[derive(Debug, Clone)]
pub struct DemoDocument {
    pub pages: Vec<DemoPage>,
    pub current_page: usize,
    /// Ids of selected nodes on the current page.
    pub selection: Vec<String>,
    pub text_styles: Vec<TextStyle>,
    pub user: Option<UserSummary>,
    next_id: u32,
}

impl DemoDocument {
    pub fn new(pages: Vec<DemoPage>) -> Self {
        Self {
            pages,
            current_page: 0,
            selection: Vec::new(),
            text_styles: Vec::new(),
            user: None,
            next_id: 100,
        }
    }

    /// A two-page document with text, frames, components and a signed-in user.
    pub fn sample() -> Self {
        let heading = DemoNode::text("1:3", "Heading", "Inter", "Bold", 32.0, "Welcome back")
            .with_text_style("Heading/H1");
        let body = DemoNode::text("1:4", "Body", "Inter", "Regular", 16.0, "Your dashboard")
            .with_text_style("Body/Regular");
        let mut card = DemoNode::new("1:2", "Card", "FRAME", (40.0, 40.0, 360.0, 240.0))
            .with_children(vec![heading, body]);
        card.layout_mode = Some("VERTICAL".into());
        let mut avatar = DemoNode::new("1:5", "Avatar", "ELLIPSE", (420.0, 40.0, 64.0, 64.0));
        avatar.fills = 1;
        let mut button = DemoNode::new("1:6", "Button", "INSTANCE", (40.0, 300.0, 120.0, 40.0));
        button.main_component = Some("Button/Primary".into());
        button.variant_properties = Some(json!({"State": "Default"}));

        let label = DemoNode::text("2:3", "Label", "Roboto", "Medium", 14.0, "Click");
        let button_main =
            DemoNode::new("2:2", "Button/Primary", "COMPONENT", (0.0, 0.0, 120.0, 40.0))
                .with_children(vec![label]);
        let icons = DemoNode::new("2:4", "Icons", "COMPONENT_SET", (200.0, 0.0, 96.0, 24.0))
            .with_children(vec![
                DemoNode::new("2:5", "Icon=Check", "COMPONENT", (0.0, 0.0, 24.0, 24.0)),
                DemoNode::new("2:6", "Icon=Close", "COMPONENT", (32.0, 0.0, 24.0, 24.0)),
            ]);

        let mut doc = Self::new(vec![
            DemoPage::new("0:1", "Screens", vec![card, avatar, button]),
            DemoPage {
                id: "0:9".into(),
                name: "---".into(),
                is_section: true,
                nodes: Vec::new(),
            },
            DemoPage::new("0:2", "Components", vec![button_main, icons]),
        ]);
        doc.text_styles = vec![
            TextStyle {
                name: "Heading/H1".into(),
                font: FontName {
                    family: "Inter".into(),
                    style: "Bold".into(),
                },
            },
            TextStyle {
                name: "Body/Regular".into(),
                font: FontName {
                    family: "Inter".into(),
                    style: "Regular".into(),
                },
            },
        ];
        doc.user = Some(UserSummary {
            id: "42".into(),
            name: "Ada Lovelace".into(),
            email: Some("ada@example.com".into()),
        });
        doc
    }

    fn content_pages(&self) -> impl Iterator<Item = &DemoPage> {
        self.pages.iter().filter(|p| !p.is_section)
    }

    fn current(&self) -> Option<&DemoPage> {
        self.pages.get(self.current_page)
    }

    pub fn handle(&mut self, request: HostRequest) -> HostAction {
        match request {
            HostRequest::GetSelection { verbose } => {
                HostAction::Reply(self.selection_data(verbose))
            }
            HostRequest::CreateShape(spec) => HostAction::Reply(match self.create_shape(&spec) {
                Ok((shape_type, id)) => HostReply::ShapeCreated { shape_type, id },
                Err(message) => host_error("creating shape", &message),
            }),
            HostRequest::GetAnalytics => HostAction::Reply(self.analytics()),
            HostRequest::GetUserInfo => HostAction::Reply(match &self.user {
                Some(user) => HostReply::UserInfo {
                    user: Some(user.clone()),
                    message: None,
                },
                None => HostReply::UserInfo {
                    user: None,
                    message: Some(OFFLINE_MESSAGE.into()),
                },
            }),
            HostRequest::GetLsData {
                sub_command,
                list_current,
            } => HostAction::Reply(HostReply::LsData {
                data: self.ls_data(sub_command, list_current),
                sub_command,
            }),
            HostRequest::ClosePlugin => HostAction::Close,
        }
    }

    fn selection_data(&self, verbose: bool) -> HostReply {
        let data = match self.current() {
            Some(page) => self
                .selection
                .iter()
                .filter_map(|id| page.find(id))
                .map(|(node, parent)| node.summary(parent, verbose))
                .collect(),
            None => Vec::new(),
        };
        HostReply::SelectionData { data }
    }

    /// Missing or zero dimensions fall back to defaults. The new node is
    /// appended to the current page and becomes the selection.
    fn create_shape(&mut self, spec: &ShapeSpec) -> Result<(ShapeType, String), String> {
        let given = |v: Option<f64>, default: f64| v.filter(|v| *v != 0.0).unwrap_or(default);
        let width = given(spec.width, 100.0);
        let height = given(spec.height, 100.0);
        let radius = given(spec.radius, 50.0);
        if width <= 0.0 || height <= 0.0 || radius <= 0.0 {
            return Err("Shape dimensions must be positive values".into());
        }

        let page_id = self.current().map(|p| p.id.clone()).ok_or("No current page")?;
        let prefix = page_id.split(':').next().unwrap_or("0").to_string();
        let id = format!("{prefix}:{}", self.next_id);
        let (x, y) = (spec.x.unwrap_or(0.0), spec.y.unwrap_or(0.0));
        let box_size = radius * 2.0;

        let mut node = match spec.shape_type {
            ShapeType::Rect => {
                let mut n = DemoNode::new(&id, "Rectangle", "RECTANGLE", (x, y, width, height));
                n.corner_radius = Some(0.0);
                n
            }
            ShapeType::Ellipse => DemoNode::new(&id, "Ellipse", "ELLIPSE", (x, y, width, height)),
            ShapeType::Circle => DemoNode::new(&id, "Ellipse", "ELLIPSE", (x, y, width, width)),
            ShapeType::Polygon => {
                let sides = spec.sides.filter(|s| *s != 0).unwrap_or(6);
                if sides < 3 {
                    return Err("Polygons require at least 3 sides".into());
                }
                let mut n = DemoNode::new(&id, "Polygon", "POLYGON", (x, y, box_size, box_size));
                n.point_count = Some(sides);
                n
            }
            ShapeType::Star => {
                let points = spec.sides.filter(|s| *s != 0).unwrap_or(5);
                if points < 3 {
                    return Err("Stars require at least 3 points".into());
                }
                let ratio = given(spec.inner_radius, 0.4);
                if ratio <= 0.0 || ratio >= 1.0 {
                    return Err("Inner radius must be positive and less than outer radius".into());
                }
                let mut n = DemoNode::new(&id, "Star", "STAR", (x, y, box_size, box_size));
                n.point_count = Some(points);
                n.inner_radius = Some(ratio);
                n
            }
        };

        let Some(page) = self.pages.get_mut(self.current_page) else {
            return Err("No current page".into());
        };
        node.fills = 1;
        page.nodes.push(node);
        self.next_id += 1;
        self.selection = vec![id.clone()];
        tracing::debug!(%id, shape = spec.shape_type.slug(), "demo shape created");
        Ok((spec.shape_type, id))
    }

    fn analytics(&self) -> HostReply {
        let count = |p: &DemoPage| p.all_nodes().len() as u64;
        HostReply::AnalyticsData {
            total_pages: self.content_pages().count() as u64,
            total_layers_in_document: self.content_pages().map(count).sum(),
            total_layers_in_current_page: self.current().map_or(0, count),
        }
    }

    fn text_nodes_on_current_page(&self) -> Vec<&DemoNode> {
        self.current()
            .map(|p| {
                p.all_nodes()
                    .into_iter()
                    .filter(|n| n.node_type == "TEXT")
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn ls_data(&self, sub_command: LsSubCommand, list_current: bool) -> String {
        let (items, what): (Vec<String>, &str) = match sub_command {
            LsSubCommand::Help => {
                return "Available lists:\nfonts       : List fonts\nstyles      : List styles\ncomponents  : List components"
                    .to_string();
            }
            LsSubCommand::Fonts => (self.fonts(list_current), "fonts"),
            LsSubCommand::Styles => (self.styles(list_current), "styles"),
            LsSubCommand::Components => (self.components(list_current), "components"),
        };
        if !items.is_empty() {
            items.join("\n")
        } else if list_current {
            format!("No {what} found in current page")
        } else {
            format!("No {what} found")
        }
    }

    fn fonts(&self, list_current: bool) -> Vec<String> {
        if list_current {
            let unique: IndexSet<String> = self
                .text_nodes_on_current_page()
                .into_iter()
                .filter_map(|n| n.font.as_ref())
                .map(|f| format!("{} {}", f.family, f.style))
                .collect();
            unique.into_iter().collect()
        } else {
            self.text_styles
                .iter()
                .map(|s| format!("{} {}", s.font.family, s.font.style))
                .collect()
        }
    }

    fn styles(&self, list_current: bool) -> Vec<String> {
        if list_current {
            let unique: IndexSet<String> = self
                .text_nodes_on_current_page()
                .into_iter()
                .filter_map(|n| n.text_style.as_ref())
                .filter(|name| self.text_styles.iter().any(|s| &s.name == *name))
                .cloned()
                .collect();
            unique.into_iter().collect()
        } else {
            self.text_styles.iter().map(|s| s.name.clone()).collect()
        }
    }

    fn components(&self, list_current: bool) -> Vec<String> {
        let of_type = |page: &DemoPage, node_type: &str| -> Vec<String> {
            page.all_nodes()
                .into_iter()
                .filter(|n| n.node_type == node_type)
                .map(|n| n.name.clone())
                .collect()
        };
        if list_current {
            let Some(page) = self.current() else {
                return Vec::new();
            };
            let mut names = of_type(page, "COMPONENT");
            names.extend(of_type(page, "COMPONENT_SET").into_iter().map(|n| format!("{n} (Set)")));
            names
        } else {
            let mut names = Vec::new();
            for page in self.content_pages() {
                names.extend(
                    of_type(page, "COMPONENT")
                        .into_iter()
                        .map(|n| format!("{n} (in {})", page.name)),
                );
                names.extend(
                    of_type(page, "COMPONENT_SET")
                        .into_iter()
                        .map(|n| format!("{n} (Set, in {})", page.name)),
                );
            }
            names
        }
    }
}

fn host_error(context: &str, message: &str) -> HostReply {
    HostReply::Error {
        context: context.to_string(),
        message: format!("Error {context}: {message}"),
    }
}

/// Serves a [`DemoDocument`] on the host side of a bus.
pub struct DemoHost {
    document: DemoDocument,
    analytics_delay: Option<Duration>,
}

impl DemoHost {
    pub fn new(document: DemoDocument) -> Self {
        Self {
            document,
            analytics_delay: None,
        }
    }

    /// Simulate slow page loading. Past [`ANALYTICS_LIMIT`] the host gives up
    /// and replies with an `error` instead.
    pub fn with_analytics_delay(mut self, delay: Duration) -> Self {
        self.analytics_delay = Some(delay);
        self
    }

    pub fn document(&self) -> &DemoDocument {
        &self.document
    }

    /// Answer requests until the console goes away or asks the host to close.
    /// Closing tears the bus down so pending console requests settle.
    pub async fn run(mut self, mut endpoint: HostEndpoint) -> DemoDocument {
        let replier = endpoint.replier();
        while let Some(request) = endpoint.next_request().await {
            tracing::debug!(request = request.type_name(), "demo host received");

            if let (HostRequest::GetAnalytics, Some(delay)) = (&request, self.analytics_delay) {
                let reply = if delay >= ANALYTICS_LIMIT {
                    host_error("loading pages", "Analytics timeout: Document may be too large")
                } else {
                    self.document.analytics()
                };
                let replier = replier.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay.min(ANALYTICS_LIMIT)).await;
                    replier.reply(&reply);
                });
                continue;
            }

            match self.document.handle(request) {
                HostAction::Reply(reply) => {
                    replier.reply(&reply);
                }
                HostAction::Close => {
                    tracing::info!("demo host closing");
                    replier.close();
                    break;
                }
            }
        }
        self.document
    }
}
