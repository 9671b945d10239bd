//! Agent metadata documents and how their content is read.
//!
//! An agent describes itself with a `<resource-agent>` XML document. The
//! functions here turn that document into parameter and action descriptors;
//! every agent flavour shares them and only adjusts their output.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// An action as declared in metadata: attribute name to value, in document order.
pub type ActionDescriptor = IndexMap<String, String>;

/// Owned copy of an XML element, detached from the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();
        // Only the text ahead of the first child element belongs to the element.
        let text = node
            .children()
            .take_while(|child| !child.is_element())
            .filter(|child| child.is_text())
            .filter_map(|child| child.text())
            .collect();
        let children = node
            .children()
            .filter(|child| child.is_element())
            .map(Self::from_node)
            .collect();

        Self {
            tag: node.tag_name().name().to_string(),
            attributes,
            text,
            children,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.tag == tag)
    }
}

/// A parsed agent metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    root: XmlElement,
}

impl MetadataDocument {
    pub fn parse(xml: &str) -> std::result::Result<Self, roxmltree::Error> {
        // Agents ship `<!DOCTYPE resource-agent SYSTEM "ra-api-1.dtd">`
        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = true;
        let document = roxmltree::Document::parse_with_options(xml, options)?;
        Ok(Self {
            root: XmlElement::from_node(document.root_element()),
        })
    }

    /// The document of an agent that describes nothing.
    pub fn empty() -> Self {
        Self {
            root: XmlElement {
                tag: "resource-agent".to_string(),
                ..XmlElement::default()
            },
        }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub shortdesc: String,
    pub longdesc: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    pub default: Option<String>,
    pub advanced: bool,
    pub deprecated: bool,
    pub obsoletes: Option<String>,
}

impl ParameterDescriptor {
    /// A parameter with nothing but a name, typed `string`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortdesc: String::new(),
            longdesc: String::new(),
            param_type: "string".to_string(),
            required: false,
            default: None,
            advanced: false,
            deprecated: false,
            obsoletes: None,
        }
    }
}

fn is_true(value: Option<&str>) -> bool {
    value == Some("1")
}

fn element_text(element: Option<&XmlElement>) -> String {
    element
        .map(|e| e.text.trim().to_string())
        .unwrap_or_default()
}

/// Attribute wins over the child element; only element text is trimmed.
fn description(root: &XmlElement, tag: &str) -> String {
    match root.attribute(tag) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => element_text(root.child(tag)),
    }
}

pub fn shortdesc(root: &XmlElement) -> String {
    description(root, "shortdesc")
}

pub fn longdesc(root: &XmlElement) -> String {
    description(root, "longdesc")
}

fn parameter(element: &XmlElement) -> ParameterDescriptor {
    let content = element.child("content");
    ParameterDescriptor {
        name: element.attribute("name").unwrap_or("").to_string(),
        shortdesc: element_text(element.child("shortdesc")),
        longdesc: element_text(element.child("longdesc")),
        param_type: content
            .and_then(|c| c.attribute("type"))
            .unwrap_or("string")
            .to_string(),
        required: is_true(element.attribute("required")),
        default: content
            .and_then(|c| c.attribute("default"))
            .map(str::to_string),
        advanced: is_true(element.attribute("advanced")),
        deprecated: is_true(element.attribute("deprecated")),
        obsoletes: element.attribute("obsoletes").map(str::to_string),
    }
}

/// Parameters declared by the document.
///
/// When one parameter obsoletes another that is also declared, the
/// obsoleting one is dropped and the obsoleted one is kept, marked deprecated.
/// Callers keep validating against the old name.
pub fn parameters(root: &XmlElement) -> Vec<ParameterDescriptor> {
    let Some(params) = root.child("parameters") else {
        return Vec::new();
    };
    let declared: Vec<ParameterDescriptor> = params
        .children_named("parameter")
        .map(parameter)
        .collect();

    let names: HashSet<&str> = declared.iter().map(|p| p.name.as_str()).collect();
    let obsoleted_by: HashMap<&str, &str> = declared
        .iter()
        .filter_map(|p| {
            p.obsoletes
                .as_deref()
                .filter(|target| names.contains(target))
                .map(|target| (target, p.name.as_str()))
        })
        .collect();

    declared
        .iter()
        .filter(|p| match p.obsoletes.as_deref() {
            Some(target) => !obsoleted_by.contains_key(target),
            None => true,
        })
        .map(|p| {
            let mut kept = p.clone();
            if obsoleted_by.contains_key(p.name.as_str()) {
                kept.deprecated = true;
            }
            kept
        })
        .collect()
}

/// Actions declared by the document, with `depth` turned into `OCF_CHECK_LEVEL`.
pub fn actions(root: &XmlElement) -> Vec<ActionDescriptor> {
    let Some(actions) = root.child("actions") else {
        return Vec::new();
    };

    actions
        .children_named("action")
        .map(|element| {
            let mut action: ActionDescriptor = element.attributes.iter().cloned().collect();
            if let Some(depth) = action.shift_remove("depth") {
                if depth != "0" {
                    action.insert("OCF_CHECK_LEVEL".to_string(), depth);
                }
            }
            action
        })
        .collect()
}

pub fn default_interval(action_name: &str) -> &'static str {
    if action_name == "monitor" {
        "60s"
    } else {
        "0s"
    }
}

/// Give every action without an explicit interval its default one.
pub fn complete_all_intervals(actions: Vec<ActionDescriptor>) -> Vec<ActionDescriptor> {
    actions
        .into_iter()
        .map(|mut action| {
            if !action.contains_key("interval") {
                let name = action.get("name").map(String::as_str).unwrap_or("");
                let interval = default_interval(name).to_string();
                action.insert("interval".to_string(), interval);
            }
            action
        })
        .collect()
}

/// Operations a new resource gets in the CIB when the user does not specify any.
///
/// `monitor` is always there, synthesized when the agent does not declare it.
/// `start` is included unless only the necessary operations are wanted.
pub fn cib_default_actions(
    declared: &[ActionDescriptor],
    necessary_only: bool,
) -> Vec<ActionDescriptor> {
    let wanted: &[&str] = if necessary_only {
        &["monitor"]
    } else {
        &["monitor", "start"]
    };

    let mut selected: Vec<ActionDescriptor> = declared
        .iter()
        .filter(|action| {
            action
                .get("name")
                .is_some_and(|name| wanted.contains(&name.as_str()))
        })
        .cloned()
        .collect();

    let has_monitor = selected
        .iter()
        .any(|action| action.get("name").is_some_and(|name| name == "monitor"));
    if !has_monitor {
        let mut monitor = ActionDescriptor::new();
        monitor.insert("name".to_string(), "monitor".to_string());
        selected.push(monitor);
    }

    complete_all_intervals(selected)
}
