//! 过滤查询
//!
//! 对当前快照做纯谓词过滤：不排序，结果保持输入顺序。

use bloodbank_core::utils::{contains_ignore_case, normalize_query};

/// 参与文本搜索的字段
pub type TextField<T> = fn(&T) -> &str;

/// 忽略大小写的子串搜索，任一字段命中即匹配；空查询匹配全部
pub fn search<'a, T>(items: &'a [T], query: &str, fields: &[TextField<T>]) -> Vec<&'a T> {
    Query::new().search(query, fields).apply(items)
}

/// 精确字段匹配；`None` 表示不过滤
pub fn filter_by_exact_field<'a, T, V, F>(items: &'a [T], field: F, value: Option<V>) -> Vec<&'a T>
where
    V: PartialEq,
    F: Fn(&T) -> V,
{
    match value {
        Some(expected) => items.iter().filter(|&item| field(item) == expected).collect(),
        None => items.iter().collect(),
    }
}

/// 以逻辑与组合的查询
pub struct Query<'q, T> {
    predicates: Vec<Box<dyn Fn(&T) -> bool + 'q>>,
}

impl<'q, T: 'q> Query<'q, T> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// 追加文本搜索条件
    pub fn search(mut self, query: &str, fields: &[TextField<T>]) -> Self {
        if let Some(needle) = normalize_query(query) {
            let fields = fields.to_vec();
            self.predicates.push(Box::new(move |item: &T| {
                fields.iter().any(|field| contains_ignore_case(field(item), &needle))
            }));
        }
        self
    }

    /// 追加精确匹配条件
    pub fn exact<V, F>(mut self, field: F, value: Option<V>) -> Self
    where
        V: PartialEq + 'q,
        F: Fn(&T) -> V + 'q,
    {
        if let Some(expected) = value {
            self.predicates.push(Box::new(move |item: &T| field(item) == expected));
        }
        self
    }

    /// 追加精确文本条件；空白值表示不过滤
    pub fn exact_text(self, field: TextField<T>, value: Option<&str>) -> Self {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self.exact(move |item: &T| field(item).to_string(), value)
    }

    pub fn matches(&self, item: &T) -> bool {
        self.predicates.iter().all(|predicate| predicate(item))
    }

    pub fn apply<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|&item| self.matches(item)).collect()
    }
}

impl<'q, T: 'q> Default for Query<'q, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Site {
        name: String,
        city: String,
        verified: bool,
    }

    fn site(name: &str, city: &str, verified: bool) -> Site {
        Site {
            name: name.to_string(),
            city: city.to_string(),
            verified,
        }
    }

    fn site_name(s: &Site) -> &str {
        &s.name
    }

    fn site_city(s: &Site) -> &str {
        &s.city
    }

    #[test]
    fn test_search_matches_any_field_case_insensitively() {
        let sites = vec![
            site("Metro Blood Bank", "Lansing", true),
            site("LA General", "Los Angeles", false),
            site("Lakeside Clinic", "Chicago", true),
            site("North Star", "Chicago", false),
        ];

        let found = search(&sites, "la", &[site_name, site_city]);
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Metro Blood Bank", "LA General", "Lakeside Clinic"]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let sites = vec![site("A", "x", true), site("B", "y", false)];
        assert_eq!(search(&sites, "   ", &[site_name]).len(), 2);
    }

    #[test]
    fn test_exact_filter_none_is_no_filter() {
        let sites = vec![site("A", "x", true), site("B", "y", false)];
        assert_eq!(filter_by_exact_field(&sites, |s| s.verified, None).len(), 2);
        assert_eq!(filter_by_exact_field(&sites, |s| s.verified, Some(false)).len(), 1);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let sites = vec![
            site("Lakeside", "Chicago", true),
            site("Lakeview", "Chicago", false),
            site("Lakewood", "Denver", true),
        ];

        let query = Query::new()
            .search("lake", &[site_name])
            .exact(|s: &Site| s.verified, Some(true))
            .exact_text(site_city, Some("Chicago"));
        let found = query.apply(&sites);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Lakeside");
    }

    #[test]
    fn test_blank_exact_text_is_no_filter() {
        let sites = vec![site("A", "x", true), site("B", "y", false)];
        let query = Query::new().exact_text(site_city, Some(""));
        assert_eq!(query.apply(&sites).len(), 2);
    }
}
