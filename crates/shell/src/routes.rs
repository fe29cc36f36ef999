//! RouteTable - Shell paths to fragment names

/// One navigable path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub fragment: String,
    pub title: String,
}

impl Route {
    pub fn new(path: impl Into<String>, fragment: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fragment: fragment.into(),
            title: title.into(),
        }
    }
}

/// Ordered list of routes; `/` resolves to the first one
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            Route::new("/invoices", "invoice_app", "Invoices"),
            Route::new("/payments", "payment_app", "Payments"),
            Route::new("/table", "mrt_table_app", "Invoice Table"),
            Route::new("/analysis", "analysis_app", "Analytics"),
        ])
    }
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Route for `path`, ignoring a trailing slash and surrounding whitespace
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = path.trim();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        if path.is_empty() || path == "/" {
            return self.routes.first();
        }
        self.routes.iter().find(|r| r.path == path)
    }

    /// Route whose fragment is `fragment`
    pub fn for_fragment(&self, fragment: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.fragment == fragment)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.path.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_paths() {
        let table = RouteTable::default();
        assert_eq!(table.resolve("/payments").unwrap().fragment, "payment_app");
        assert_eq!(table.resolve("/analysis/").unwrap().fragment, "analysis_app");
        assert_eq!(table.resolve(" /table ").unwrap().fragment, "mrt_table_app");
    }

    #[test]
    fn test_root_aliases_first_route() {
        let table = RouteTable::default();
        assert_eq!(table.resolve("/").unwrap().path, "/invoices");
        assert_eq!(table.resolve("").unwrap().path, "/invoices");
    }

    #[test]
    fn test_unknown_path() {
        let table = RouteTable::default();
        assert!(table.resolve("/settings").is_none());
        assert!(table.resolve("payments").is_none());
        assert!(RouteTable::new(Vec::new()).resolve("/").is_none());
    }

    #[test]
    fn test_lookup_by_fragment() {
        let table = RouteTable::default();
        assert_eq!(table.for_fragment("invoice_app").unwrap().title, "Invoices");
        assert_eq!(table.paths(), vec!["/invoices", "/payments", "/table", "/analysis"]);
    }
}
