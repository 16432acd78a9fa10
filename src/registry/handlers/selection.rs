use std::sync::Arc;

use crate::error::ConsoleError;
use crate::protocol::{HostReply, HostRequest, NodeSummary, ReplyKind};
use crate::registry::params::{format_number, SelectionParams};
use crate::registry::{unexpected_reply, CommandName, CommandOutput};
use crate::state::ConsoleState;

pub async fn selection(
    state: Arc<ConsoleState>,
    args: Vec<String>,
) -> Result<CommandOutput, ConsoleError> {
    let p = SelectionParams::from_args(&args);
    let reply = state
        .bridge
        .request_within(
            HostRequest::GetSelection { verbose: p.verbose },
            state.expect(ReplyKind::SelectionData),
            state.deadline_for(CommandName::Selection),
        )
        .await?;
    match reply {
        HostReply::SelectionData { data } => {
            Ok(CommandOutput::new(render_selection(&data, p.verbose)))
        }
        other => Err(unexpected_reply(&other)),
    }
}

pub(crate) fn render_selection(nodes: &[NodeSummary], verbose: bool) -> String {
    if nodes.is_empty() {
        return "No elements selected".to_string();
    }
    if verbose {
        nodes
            .iter()
            .map(verbose_block)
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        let rows: Vec<String> = nodes
            .iter()
            .map(|n| format!("{} | {} | {}", n.id, n.name, n.node_type))
            .collect();
        format!("ID | Name | Type\n{}", rows.join("\n"))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn json_or_empty(value: Option<&serde_json::Value>) -> String {
    value
        .filter(|v| !v.is_null())
        .map_or_else(|| "{}".to_string(), ToString::to_string)
}

fn verbose_block(node: &NodeSummary) -> String {
    let n = format_number;
    let opacity = (node.opacity.unwrap_or(1.0) * 100.0).round();
    let mut lines = vec![
        format!("ID: {}", node.id),
        format!("Name: {}", node.name),
        format!("Type: {}", node.node_type),
        format!("Visible: {}", yes_no(node.visible)),
        format!("Locked: {}", yes_no(node.locked)),
        format!("Position: ({}, {})", n(node.x), n(node.y)),
        format!("Dimensions: {}x{}", n(node.width), n(node.height)),
        format!("Rotation: {}°", n(node.rotation)),
        format!("Opacity: {}%", n(opacity)),
    ];
    lines.extend(type_specific_lines(node));
    lines.push(match &node.parent {
        Some(parent) => format!("Parent: {} ({})", parent.name, parent.node_type),
        None => "Parent: None".to_string(),
    });
    lines.join("\n")
}

fn type_specific_lines(node: &NodeSummary) -> Vec<String> {
    let n = format_number;
    let mut info = Vec::new();
    match node.node_type.as_str() {
        "FRAME" | "GROUP" => {
            info.push(format!(
                "Children: {}",
                node.children.as_ref().map_or(0, Vec::len)
            ));
            if node.node_type == "FRAME" {
                let auto = node.layout_mode.as_deref().is_some_and(|m| m != "NONE");
                info.push(format!("Auto Layout: {}", yes_no(auto)));
                info.push(format!(
                    "Constraints: {}",
                    json_or_empty(node.constraints.as_ref())
                ));
            }
        }
        "TEXT" => {
            info.push(match &node.font_name {
                Some(font) => format!("Font: {} {}", font.family, font.style),
                None => "Font: Unknown ".to_string(),
            });
            info.push(format!("Font Size: {}px", n(node.font_size.unwrap_or(0.0))));
            info.push(format!("Text: {}", node.characters.as_deref().unwrap_or("")));
        }
        "RECTANGLE" | "ELLIPSE" | "POLYGON" | "STAR" => {
            info.push(format!("Fills: {}", node.fills.as_ref().map_or(0, Vec::len)));
            info.push(format!(
                "Strokes: {}",
                node.strokes.as_ref().map_or(0, Vec::len)
            ));
            match node.node_type.as_str() {
                "RECTANGLE" => info.push(format!(
                    "Corner Radius: {}px",
                    n(node.corner_radius.unwrap_or(0.0))
                )),
                "POLYGON" => info.push(format!("Points: {}", node.point_count.unwrap_or(0))),
                "STAR" => {
                    info.push(format!("Points: {}", node.point_count.unwrap_or(0)));
                    info.push(format!(
                        "Inner Radius: {}",
                        n(node.inner_radius.unwrap_or(0.0))
                    ));
                }
                _ => {}
            }
        }
        "INSTANCE" => {
            info.push(format!(
                "Main Component: {}",
                node.main_component
                    .as_ref()
                    .map_or("None", |c| c.name.as_str())
            ));
            info.push(format!(
                "Variant Properties: {}",
                json_or_empty(node.variant_properties.as_ref())
            ));
        }
        _ => {}
    }
    info
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::protocol::{FontName, NodeRef};
    use serde_json::json;

    fn page() -> NodeRef {
        NodeRef {
            id: "0:1".into(),
            name: "Page 1".into(),
            node_type: "PAGE".into(),
        }
    }

    #[test]
    fn empty_selection() {
        assert_eq!(render_selection(&[], false), "No elements selected");
        assert_eq!(render_selection(&[], true), "No elements selected");
    }

    #[test]
    fn compact_table_has_header() {
        let nodes = vec![
            NodeSummary::basic("1:2", "Card", "FRAME"),
            NodeSummary::basic("1:3", "Title", "TEXT"),
        ];
        assert_eq!(
            render_selection(&nodes, false),
            "ID | Name | Type\n1:2 | Card | FRAME\n1:3 | Title | TEXT"
        );
    }

    #[test]
    fn verbose_text_node() {
        let mut node = NodeSummary::basic("1:3", "Title", "TEXT");
        node.x = 10.0;
        node.y = 20.5;
        node.width = 120.0;
        node.height = 24.0;
        node.opacity = Some(0.5);
        node.parent = Some(page());
        node.font_name = Some(FontName {
            family: "Inter".into(),
            style: "Bold".into(),
        });
        node.font_size = Some(16.0);
        node.characters = Some("Hello".into());

        assert_eq!(
            render_selection(&[node], true),
            "ID: 1:3\nName: Title\nType: TEXT\nVisible: Yes\nLocked: No\n\
             Position: (10, 20.5)\nDimensions: 120x24\nRotation: 0°\nOpacity: 50%\n\
             Font: Inter Bold\nFont Size: 16px\nText: Hello\nParent: Page 1 (PAGE)"
        );
    }

    #[test]
    fn missing_opacity_reads_as_full() {
        let mut node = NodeSummary::basic("1:4", "Box", "RECTANGLE");
        node.opacity = None;
        let out = render_selection(&[node], true);
        assert!(out.contains("Opacity: 100%"));
        assert!(out.contains("Fills: 0\nStrokes: 0\nCorner Radius: 0px"));
        assert!(out.ends_with("Parent: None"));
    }

    #[test]
    fn frame_and_instance_details() {
        let mut frame = NodeSummary::basic("1:5", "Stack", "FRAME");
        frame.children = Some(vec![json!({}), json!({})]);
        frame.layout_mode = Some("VERTICAL".into());
        frame.constraints = Some(json!({"horizontal": "MIN", "vertical": "MIN"}));
        let out = render_selection(&[frame], true);
        assert!(out.contains(
            "Children: 2\nAuto Layout: Yes\nConstraints: {\"horizontal\":\"MIN\",\"vertical\":\"MIN\"}"
        ));

        let mut instance = NodeSummary::basic("1:6", "Button", "INSTANCE");
        instance.main_component = Some(NodeRef {
            id: "1:1".into(),
            name: "Button/Primary".into(),
            node_type: "COMPONENT".into(),
        });
        let out = render_selection(&[instance], true);
        assert!(out.contains("Main Component: Button/Primary\nVariant Properties: {}"));
    }

    #[test]
    fn star_lists_points_and_inner_radius() {
        let mut star = NodeSummary::basic("1:7", "Star", "STAR");
        star.point_count = Some(5);
        star.inner_radius = Some(0.4);
        let out = render_selection(&[star], true);
        assert!(out.contains("Points: 5\nInner Radius: 0.4"));
    }
}
