//! Marker attributes, class names and header names shared with page authors and servers.

// Ajax navigation
pub const AJAX_MARKER: &str = "data-ln-ajax";
pub const AJAX_OPT_OUT: &str = "false";
pub const AJAX_LOADING_CLASS: &str = "ln-ajax--loading";
pub const CSRF_META_NAME: &str = "csrf-token";
pub const CSRF_FIELD: &str = "_token";

// Headers sent on every dispatched request. Lowercase, as `http` stores them.
pub const CSRF_HEADER: &str = "x-csrf-token";
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
pub const ACCEPT_JSON: &str = "application/json";

// Active link tracking
pub const NAV_MARKER: &str = "data-ln-nav";

// Toasts
pub const TOAST_MARKER: &str = "data-ln-toast";
pub const TOAST_ITEM_MARKER: &str = "data-ln-toast-item";
pub const TOAST_TIMEOUT_ATTR: &str = "data-ln-toast-timeout";
pub const TOAST_MAX_ATTR: &str = "data-ln-toast-max";
pub const TOAST_CONTAINER_ID: &str = "ln-toast-container";
pub const TOAST_DEFAULT_TIMEOUT_MS: u64 = 6000;
pub const TOAST_DEFAULT_MAX: usize = 5;

// Feature tags used by the attachment registry and listener ownership.
pub const FEATURE_AJAX_LINK: &str = "ajax-link";
pub const FEATURE_AJAX_FORM: &str = "ajax-form";
pub const FEATURE_NAV: &str = "nav";
pub const FEATURE_NAV_LINK: &str = "nav-link";
pub const FEATURE_TOAST: &str = "toast";
pub const FEATURE_TOAST_ITEM: &str = "toast-item";
