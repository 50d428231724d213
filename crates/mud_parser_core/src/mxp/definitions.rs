//! Server definitions: `<!ELEMENT>`, `<!ATTLIST>`, `<!TAG>`, `<!ENTITY>`,
//! `</VAR>`, and the expansion of the custom elements they declare.
//!
//! Ownership: definitions from the server may replace local ones, local
//! definitions never replace server ones.

use crate::ParserSink;

use super::args::{TagArg, close_tags, strip_quotes};
use super::{Element, Entity, LineTag, MAX_CAPTURE_DEPTH, MxpEngine, StyleTag, TagResult};

/// Parses an attribute declaration list (`name=default other`) into
/// lower-cased names with their default values.
fn parse_attribute_list(list: &str) -> Vec<(String, String)> {
    list.split_whitespace()
        .map(|item| {
            let item = strip_quotes(item);
            match item.split_once('=') {
                Some((name, default)) => (name.to_ascii_lowercase(), strip_quotes(default).to_string()),
                None => (item.to_ascii_lowercase(), String::new()),
            }
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// What `<!ENTITY>` or `</VAR>` asks to do with the named entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityAction {
    Set,
    Delete,
    Add,
    Remove,
}

impl MxpEngine {
    pub(crate) fn define_element(&mut self, args: &[TagArg], remote: bool) -> TagResult {
        let mut element = Element {
            remote,
            ..Element::default()
        };
        let mut delete = false;
        for (x, arg) in args.iter().enumerate() {
            match arg.name.as_deref() {
                Some("ATT") => element.attributes = parse_attribute_list(arg.text()),
                Some("TAG") => element.tag = arg.text().trim().parse().ok(),
                Some("FLAG") => element.flag = arg.text().to_string(),
                Some(other) => log::debug!("invalid argument for !ELEMENT: {other}"),
                _ if arg.is_flag("OPEN") => element.open = true,
                _ if arg.is_flag("SECURE") => element.open = false,
                _ if arg.is_flag("EMPTY") => element.empty = true,
                _ if arg.is_flag("DELETE") => delete = true,
                _ => match x {
                    0 => element.name = arg.text().to_ascii_uppercase(),
                    1 => {
                        element.definition = arg.text().to_string();
                        element.close_definition = close_tags(&element.definition);
                        log::debug!("MXP close definition: {}", element.close_definition);
                    }
                    2 => element.attributes = parse_attribute_list(arg.text()),
                    3 => element.tag = arg.text().trim().parse().ok(),
                    4 => element.flag = arg.text().to_string(),
                    _ => {}
                },
            }
        }
        if element.name.is_empty() {
            return TagResult::Handled;
        }

        if delete {
            if self
                .elements
                .get(&element.name)
                .is_some_and(|existing| existing.remote == remote || existing.open)
            {
                self.elements.remove(&element.name);
            }
            return TagResult::Handled;
        }

        if let Some(index) = element.tag.filter(|t| (20..100).contains(t)) {
            let mut line_tag = LineTag::new(index, remote);
            line_tag.element = element.name.clone();
            self.store_line_tag(line_tag);
        }

        let allowed = self
            .elements
            .get(&element.name)
            .is_none_or(|existing| remote || existing.remote == remote || existing.open);
        if allowed {
            self.elements.insert(element.name.clone(), element);
        }
        TagResult::Handled
    }

    pub(crate) fn define_attlist(&mut self, args: &[TagArg], remote: bool) -> TagResult {
        let Some((first, rest)) = args.split_first() else {
            return TagResult::Handled;
        };
        let name = first.text().to_ascii_uppercase();
        let Some(element) = self.elements.get_mut(&name) else {
            return TagResult::Handled;
        };
        if element.remote != remote && !element.open {
            return TagResult::Handled;
        }
        element.attributes = rest.iter().flat_map(|arg| parse_attribute_list(&arg.raw)).collect();
        TagResult::Handled
    }

    pub(crate) fn define_line_tag(&mut self, args: &[TagArg], remote: bool) -> TagResult {
        let mut line_tag = LineTag::new(-1, remote);
        for (x, arg) in args.iter().enumerate() {
            match arg.name.as_deref() {
                Some("WINDOWNAME") => line_tag.window = arg.text().to_string(),
                Some("FORE") => line_tag.fore = arg.text().parse().ok().or(line_tag.fore),
                Some("BACK") => line_tag.back = arg.text().parse().ok().or(line_tag.back),
                Some(other) => log::debug!("invalid argument for !TAG: {other}"),
                None if arg.is_flag("GAG") => line_tag.gag = true,
                None if arg.is_flag("ENABLE") => line_tag.enabled = true,
                None if arg.is_flag("DISABLE") => line_tag.enabled = false,
                None => match x {
                    0 => line_tag.index = arg.text().trim().parse().unwrap_or(-1),
                    1 => line_tag.window = arg.text().to_string(),
                    2 => line_tag.fore = arg.text().parse().ok().or(line_tag.fore),
                    3 => line_tag.back = arg.text().parse().ok().or(line_tag.back),
                    _ => {}
                },
            }
        }
        if !(0..100).contains(&line_tag.index) {
            log::debug!("!TAG index out of range: {}", line_tag.index);
            return TagResult::Handled;
        }

        line_tag.definition = match (line_tag.fore, line_tag.back) {
            (Some(fore), Some(back)) => format!("<C \"{}\" \"{}\">", fore.to_hex(), back.to_hex()),
            (Some(fore), None) => format!("<C \"{}\">", fore.to_hex()),
            (None, Some(back)) => format!("<C BACK=\"{}\">", back.to_hex()),
            (None, None) => String::new(),
        };
        if !line_tag.definition.is_empty() {
            line_tag.close_definition = "</C>".to_string();
        }
        self.store_line_tag(line_tag);
        TagResult::Handled
    }

    fn store_line_tag(&mut self, line_tag: LineTag) {
        let allowed = self
            .line_tags
            .get(&line_tag.index)
            .is_none_or(|existing| line_tag.remote || existing.remote == line_tag.remote);
        if allowed {
            self.line_tags.insert(line_tag.index, line_tag);
        }
    }

    pub(crate) fn define_entity(&mut self, args: &[TagArg], remote: bool) -> TagResult {
        let mut entity = Entity {
            remote,
            ..Entity::default()
        };
        let action = entity_arguments(&mut entity, args, false);
        self.apply_entity(entity, action);
        TagResult::Handled
    }

    /// `</VAR>`: the captured text becomes the value of the entity named by the `<VAR>` arguments.
    pub(crate) fn close_var(&mut self, remote: bool) {
        let Some(frame) = self.styles.clear_to_tag(StyleTag::Var, "") else {
            return;
        };
        let mut entity = Entity {
            remote,
            value: self.state.captured.pop().unwrap_or_default(),
            ..Entity::default()
        };
        log::debug!("MXP captured: {}", entity.value);
        let action = entity_arguments(&mut entity, &frame.saved_args, true);
        self.apply_entity(entity, action);
    }

    fn apply_entity(&mut self, entity: Entity, action: EntityAction) {
        if entity.name.is_empty() {
            return;
        }
        let same_origin = self.entities.get(&entity.name).map(|existing| existing.remote == entity.remote);
        match (action, same_origin) {
            (EntityAction::Delete, Some(true)) => {
                self.entities.remove(&entity.name);
            }
            (EntityAction::Add, Some(true)) => {
                if let Some(existing) = self.entities.get_mut(&entity.name) {
                    if existing.value.is_empty() {
                        existing.value = entity.value;
                    } else {
                        existing.value.push('|');
                        existing.value.push_str(&entity.value);
                    }
                }
            }
            (EntityAction::Remove, Some(true)) => {
                if let Some(existing) = self.entities.get_mut(&entity.name) {
                    existing.value = existing.value.split('|').filter(|v| *v != entity.value).collect::<Vec<_>>().join("|");
                }
            }
            (EntityAction::Set | EntityAction::Add, None) | (EntityAction::Set, Some(true)) => {
                self.entities.insert(entity.name.clone(), entity);
            }
            _ => {}
        }
    }

    /// Opening or closing tag of a custom element. `None` when no such element
    /// is usable on the current line. An opening tag that cannot be expanded
    /// leaves the engine untouched.
    pub(crate) fn expand_element(&mut self, closing: bool, name: &str, args: &[TagArg], can_expand: bool, sink: &mut dyn ParserSink) -> Option<TagResult> {
        let element = self.elements.get(name)?;
        if !element.open && !self.state.line_type.is_secure() {
            return None;
        }
        if !closing && !can_expand {
            log::warn!("MXP expansion limit reached, ignoring <{name}>");
            return Some(TagResult::Handled);
        }
        if !closing && !element.empty && self.state.captured.len() >= MAX_CAPTURE_DEPTH {
            log::warn!("MXP elements nested too deep, ignoring <{name}>");
            return Some(TagResult::Handled);
        }
        let element = element.clone();
        let line_tag = element
            .tag
            .filter(|t| (20..100).contains(t))
            .and_then(|t| self.line_tags.get(&t))
            .filter(|t| t.enabled)
            .cloned();

        if closing {
            if element.empty {
                return None;
            }
            let captured = self.state.captured.pop().unwrap_or_default();
            self.styles.clear_to_tag(StyleTag::Custom, &element.name);
            if !element.flag.is_empty() {
                let variable = element
                    .flag
                    .get(..4)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("set "))
                    .and_then(|_| element.flag.get(4..));
                if let Some(variable) = variable.filter(|v| !v.is_empty()) {
                    sink.set_variable(variable, &captured);
                }
                sink.mxp_flag(&element.flag, &captured);
            }
            let mut text = element.close_definition.clone();
            if let Some(line_tag) = &line_tag {
                text.push_str(&line_tag.close_definition);
            }
            self.state.gagged = false;
            return Some(TagResult::Expand(text));
        }

        let mut values = element.attributes.clone();
        for (x, arg) in args.iter().enumerate() {
            let declared = arg
                .name
                .as_deref()
                .and_then(|n| values.iter().position(|(attr, _)| attr.eq_ignore_ascii_case(n)));
            match declared {
                Some(pos) => values[pos].1 = arg.text().to_string(),
                None if x < values.len() => values[x].1 = strip_quotes(&arg.raw).to_string(),
                None => {}
            }
        }
        let mut text = element.definition.clone();
        for (attr, value) in &values {
            text = text.replace(&format!("&{attr};"), value);
        }

        if !element.empty {
            self.state.captured.push(String::new());
            let frame = self.styles.push_derived(StyleTag::Custom, element.open);
            frame.custom = element.name.clone();
        }
        let mut gagged = false;
        if let Some(line_tag) = &line_tag {
            text.insert_str(0, &line_tag.definition);
            gagged = line_tag.gag;
        }
        self.state.gagged = gagged;
        Some(TagResult::Expand(text))
    }
}

/// Fills `entity` from `<!ENTITY name value desc>` style arguments (`</VAR>`
/// arguments have no value position) and returns the requested action.
fn entity_arguments(entity: &mut Entity, args: &[TagArg], from_var: bool) -> EntityAction {
    let mut action = EntityAction::Set;
    for (x, arg) in args.iter().enumerate() {
        match arg.name.as_deref() {
            Some("DESC") => entity.description = arg.text().to_string(),
            Some(other) => log::debug!("invalid argument for entity: {other}"),
            _ if arg.is_flag("PRIVATE") => entity.publish = false,
            _ if arg.is_flag("PUBLISH") => entity.publish = true,
            _ if arg.is_flag("DELETE") => action = EntityAction::Delete,
            _ if arg.is_flag("ADD") => action = EntityAction::Add,
            _ if arg.is_flag("REMOVE") => action = EntityAction::Remove,
            _ => match (x, from_var) {
                (0, _) => entity.name = strip_quotes(&arg.raw).to_string(),
                (1, false) => entity.value = arg.text().to_string(),
                (1, true) | (2, false) => entity.description = arg.text().to_string(),
                _ => {}
            },
        }
    }
    action
}
