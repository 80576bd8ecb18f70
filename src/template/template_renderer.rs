use std::path::PathBuf;
use std::sync::Arc;

use log::error;
use minijinja::value::ViaDeserialize;
use minijinja::{Environment, Error as JinjaError, ErrorKind, Value};

use crate::error::{Error, Result};
use crate::filter::{FilterSet, NodeNameFilter};
use crate::generator::context::{ArtifactContext, DownloadUrl};
use crate::generator::formats::{
    get_clash_node_names, get_clash_nodes, get_node_names, get_quantumult_x_nodes,
    get_shadowsocks_nodes, get_surge_nodes,
};
use crate::models::NodeConfig;
use crate::utils::{base64_encode, url_safe_base64_encode};

/// File extension of templates in the template directory.
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// Renders a named template against an artifact context.
pub trait TemplateRenderer {
    fn render(&self, template: &str, context: &ArtifactContext) -> Result<String>;
}

/// Renders `<template_dir>/<name>.tpl` files with minijinja.
#[derive(Debug, Clone)]
pub struct MiniJinjaRenderer {
    template_dir: PathBuf,
}

impl MiniJinjaRenderer {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        MiniJinjaRenderer {
            template_dir: template_dir.into(),
        }
    }

    /// A fresh environment bound to one context's filters and urls.
    fn environment(&self, context: &ArtifactContext) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&self.template_dir));
        env.set_keep_trailing_newline(true);

        env.add_filter("url_encode", filter_url_encode);
        env.add_filter("url_decode", filter_url_decode);

        let filters = Arc::new(context.filters.clone());
        let download = Arc::new(context.download.clone());
        register_helpers(&mut env, filters, download);
        env
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &ArtifactContext) -> Result<String> {
        let env = self.environment(context);
        let name = format!("{}.{}", template, TEMPLATE_EXTENSION);
        let rendered = env
            .get_template(&name)
            .and_then(|tmpl| tmpl.render(context));
        rendered.map_err(|e| {
            error!("Template {} render failed! Reason: {}", name, e);
            Error::Render(e.to_string())
        })
    }
}

fn lookup<'a>(
    filters: &'a FilterSet,
    name: Option<&str>,
) -> std::result::Result<Option<&'a NodeNameFilter>, JinjaError> {
    match name {
        None => Ok(None),
        Some(name) => filters.get(name).map(Some).ok_or_else(|| {
            JinjaError::new(
                ErrorKind::InvalidOperation,
                format!("Unknown filter: {}", name),
            )
        }),
    }
}

fn register_helpers(
    env: &mut Environment<'static>,
    filters: Arc<FilterSet>,
    download: Arc<DownloadUrl>,
) {
    env.add_function("getDownloadUrl", move |name: String| -> String {
        download.get(&name)
    });

    let f = Arc::clone(&filters);
    env.add_function(
        "getNodeNames",
        move |nodes: ViaDeserialize<Vec<NodeConfig>>,
              filter: Option<String>,
              separator: Option<String>|
              -> std::result::Result<String, JinjaError> {
            let filter = lookup(&f, filter.as_deref())?;
            Ok(get_node_names(
                &nodes.0,
                filter,
                separator.as_deref().unwrap_or(", "),
            ))
        },
    );

    let f = Arc::clone(&filters);
    env.add_function(
        "getClashNodeNames",
        move |nodes: ViaDeserialize<Vec<NodeConfig>>,
              filter: Option<String>|
              -> std::result::Result<Vec<String>, JinjaError> {
            let filter = lookup(&f, filter.as_deref())?;
            Ok(get_clash_node_names(&nodes.0, filter))
        },
    );

    let f = Arc::clone(&filters);
    env.add_function(
        "getClashNodes",
        move |nodes: ViaDeserialize<Vec<NodeConfig>>,
              filter: Option<String>|
              -> std::result::Result<Value, JinjaError> {
            let filter = lookup(&f, filter.as_deref())?;
            Ok(Value::from_serialize(get_clash_nodes(&nodes.0, filter)))
        },
    );

    let f = Arc::clone(&filters);
    env.add_function(
        "getSurgeNodes",
        move |nodes: ViaDeserialize<Vec<NodeConfig>>,
              filter: Option<String>|
              -> std::result::Result<String, JinjaError> {
            let filter = lookup(&f, filter.as_deref())?;
            Ok(get_surge_nodes(&nodes.0, filter))
        },
    );

    let f = Arc::clone(&filters);
    env.add_function(
        "getQuantumultXNodes",
        move |nodes: ViaDeserialize<Vec<NodeConfig>>,
              filter: Option<String>|
              -> std::result::Result<String, JinjaError> {
            let filter = lookup(&f, filter.as_deref())?;
            Ok(get_quantumult_x_nodes(&nodes.0, filter))
        },
    );

    let f = Arc::clone(&filters);
    env.add_function(
        "getShadowsocksNodes",
        move |nodes: ViaDeserialize<Vec<NodeConfig>>,
              filter: Option<String>,
              group: Option<String>|
              -> std::result::Result<String, JinjaError> {
            let filter = lookup(&f, filter.as_deref())?;
            Ok(get_shadowsocks_nodes(&nodes.0, filter, group.as_deref()))
        },
    );

    let f = filters;
    env.add_function(
        "filterMatches",
        move |filter: String, node_name: String| -> std::result::Result<bool, JinjaError> {
            let filter = lookup(&f, Some(filter.as_str()))?;
            Ok(filter.is_some_and(|filter| filter.matches(&node_name)))
        },
    );

    env.add_function("toBase64", |s: String| -> String { base64_encode(&s) });
    env.add_function("toUrlSafeBase64", |s: String| -> String {
        url_safe_base64_encode(&s)
    });
}

// Filter implementations

fn filter_url_encode(value: Value) -> std::result::Result<String, JinjaError> {
    let s = value.to_string();
    Ok(urlencoding::encode(&s).to_string())
}

fn filter_url_decode(value: Value) -> std::result::Result<String, JinjaError> {
    let s = value.to_string();
    match urlencoding::decode(&s) {
        Ok(decoded) => Ok(decoded.to_string()),
        Err(e) => Err(JinjaError::new(
            ErrorKind::InvalidOperation,
            format!("URL decode error: {}", e),
        )),
    }
}
