use crate::constants::{
    AJAX_LOADING_CLASS, AJAX_MARKER, AJAX_OPT_OUT, CSRF_FIELD, CSRF_META_NAME, NAV_MARKER,
    TOAST_CONTAINER_ID, TOAST_DEFAULT_MAX, TOAST_DEFAULT_TIMEOUT_MS, TOAST_MARKER,
};
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Settings for every enhancer installed on a document.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnhancerConfigInner {
    pub ajax: AjaxConfig,
    pub nav: NavConfig,
    pub toast: ToastConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into widgets.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct EnhancerConfig {
    #[serde(flatten, default)]
    inner: Arc<EnhancerConfigInner>,
}

impl Deref for EnhancerConfig {
    type Target = EnhancerConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for EnhancerConfig {
    fn deref_mut(&mut self) -> &mut EnhancerConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Whether a form submission may change the recorded location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormHistoryPolicy {
    /// GET forms push their final URL (query included).
    #[default]
    GetOnly,
    /// Only anchors push history entries.
    Never,
}

/// What happens when an element is activated while its previous exchange is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// The activation is swallowed: default navigation stays prevented, nothing is sent.
    #[default]
    IgnoreWhileLoading,
    /// Every activation starts an exchange.
    Allow,
}

/// Ajax navigation controller configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AjaxConfig {
    pub marker: String,
    pub opt_out: String,
    pub loading_class: String,
    pub csrf_meta: String,
    pub csrf_field: String,
    pub form_history: FormHistoryPolicy,
    pub dedupe: DedupePolicy,
}

/// Active link tracker configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub marker: String,
}

/// Toast consumer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub marker: String,
    pub container_id: String,
    pub timeout_ms: u64,
    pub max_items: usize,
}

// --- Default ---

impl Default for AjaxConfig {
    fn default() -> Self {
        Self {
            marker: AJAX_MARKER.to_owned(),
            opt_out: AJAX_OPT_OUT.to_owned(),
            loading_class: AJAX_LOADING_CLASS.to_owned(),
            csrf_meta: CSRF_META_NAME.to_owned(),
            csrf_field: CSRF_FIELD.to_owned(),
            form_history: FormHistoryPolicy::default(),
            dedupe: DedupePolicy::default(),
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self { marker: NAV_MARKER.to_owned() }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            marker: TOAST_MARKER.to_owned(),
            container_id: TOAST_CONTAINER_ID.to_owned(),
            timeout_ms: TOAST_DEFAULT_TIMEOUT_MS,
            max_items: TOAST_DEFAULT_MAX,
        }
    }
}
