//! Process-wide column type registry.
//!
//! Built once at startup (optionally extended with custom types) and passed
//! into the grid; read-only afterwards.

use std::collections::HashMap;

use serde_json::Value;

use super::{
    value_to_text, CellContent, CellOutput, Column, ColumnConfig, Formatter, MarkupNode, Region,
    WidgetHandle,
};
use crate::error::{GridError, Result};

/// Builds the formatter for a column from its config.
pub type ColumnFactory = fn(&ColumnConfig) -> Formatter;

/// Maps column type names to formatter factories.
#[derive(Clone)]
pub struct ColumnTypeRegistry {
    factories: HashMap<String, ColumnFactory>,
}

impl Default for ColumnTypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ColumnTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ColumnTypeRegistry")
            .field("types", &names)
            .finish()
    }
}

impl ColumnTypeRegistry {
    /// Registry with no types at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in column types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("column", text_column);
        registry.register("number", number_column);
        registry.register("check", check_column);
        registry.register("rownumber", row_number_column);
        registry.register("widget", widget_column);
        registry
    }

    /// Register (or replace) a column type.
    pub fn register(&mut self, type_name: &str, factory: ColumnFactory) {
        self.factories.insert(type_name.to_string(), factory);
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Resolve a config (and its children) into a column.
    pub(crate) fn create(
        &self,
        config: &ColumnConfig,
        parent_region: Option<Region>,
        counter: &mut usize,
    ) -> Result<Column> {
        let type_name = config.type_name.as_deref().unwrap_or("column");
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| GridError::ColumnTypeNotRegistered(type_name.to_string()))?;

        let id = match (&config.id, &config.field) {
            (Some(id), _) => id.clone(),
            (None, Some(field)) => field.clone(),
            (None, None) => format!("col{counter}"),
        };
        *counter += 1;

        let region = if config.locked {
            Region::Locked
        } else {
            parent_region.unwrap_or(config.region)
        };

        let children = config
            .children
            .iter()
            .map(|c| self.create(c, Some(region), counter))
            .collect::<Result<Vec<_>>>()?;

        Ok(Column {
            id,
            field: config.field.clone(),
            text: config.text.clone(),
            type_name: type_name.to_string(),
            width: config.width.max(0.0),
            hidden: config.hidden,
            region,
            children,
            formatter: factory(config),
        })
    }
}

fn text_column(_config: &ColumnConfig) -> Formatter {
    Formatter::new(|ctx: &super::CellContext<'_>| CellOutput::text(value_to_text(ctx.value)))
}

fn number_column(config: &ColumnConfig) -> Formatter {
    let decimals = config.decimals;
    Formatter::new(move |ctx: &super::CellContext<'_>| {
        let Some(n) = ctx.value.and_then(Value::as_f64) else {
            return CellOutput::default();
        };
        match decimals {
            Some(d) => CellOutput::text(format!("{n:.prec$}", prec = d as usize)),
            None => CellOutput::text(value_to_text(ctx.value)),
        }
    })
}

fn check_column(_config: &ColumnConfig) -> Formatter {
    Formatter::new(|ctx: &super::CellContext<'_>| {
        let checked = match ctx.value {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            _ => false,
        };
        let mut input = MarkupNode::new("input").attr("type", "checkbox");
        if checked {
            input = input.attr("checked", "checked");
        }
        CellContent::Markup(input).into()
    })
}

fn row_number_column(_config: &ColumnConfig) -> Formatter {
    Formatter::new(|ctx: &super::CellContext<'_>| CellOutput::text((ctx.data_index + 1).to_string()))
}

fn widget_column(config: &ColumnConfig) -> Formatter {
    let kind = config.widget.clone().unwrap_or_else(|| "button".to_string());
    Formatter::new(move |ctx: &super::CellContext<'_>| {
        CellContent::Widget(WidgetHandle {
            kind: kind.clone(),
            key: format!("{}:{}", ctx.record.id, ctx.column.id),
        })
        .into()
    })
}
