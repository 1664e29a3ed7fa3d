//! String transforms applied to every markup file before it is written.

use std::sync::LazyLock;

use regex::Regex;

static CROSSORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(type="module"|rel="stylesheet") crossorigin\b(?:="[^"]*")?"#)
        .expect("Invalid crossorigin regex")
});

static NESTED_ASSETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.\./)+assets/").expect("Invalid assets path regex"));

/// Drop `crossorigin` from module scripts and stylesheet links.
///
/// Only the attribute directly after `type="module"` or `rel="stylesheet"` is
/// removed; the rest of the tag is left as is.
pub fn strip_crossorigin(html: &str) -> String {
    CROSSORIGIN.replace_all(html, "$1").into_owned()
}

/// Collapse `../../assets/` (any depth) to `../assets/`.
pub fn fix_asset_paths(html: &str) -> String {
    NESTED_ASSETS.replace_all(html, "../assets/").into_owned()
}

/// Apply all markup transforms in order.
pub fn finalize_markup(html: &str) -> String {
    fix_asset_paths(&strip_crossorigin(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_nested_asset_paths() {
        assert_eq!(fix_asset_paths("../../assets/img.png"), "../assets/img.png");
        assert_eq!(
            fix_asset_paths(r#"<img src="../../../assets/images/logo.svg">"#),
            r#"<img src="../assets/images/logo.svg">"#
        );
    }

    #[test]
    fn leaves_canonical_paths_alone() {
        assert_eq!(fix_asset_paths("../assets/img.png"), "../assets/img.png");
        assert_eq!(fix_asset_paths("../../vendor/lib.js"), "../../vendor/lib.js");
        assert_eq!(fix_asset_paths("assets/img.png"), "assets/img.png");
    }

    #[test]
    fn fixing_is_idempotent() {
        let html = r#"<link href="../../assets/css/app.css"><script src="../../../assets/js/menu.js"></script>"#;
        let once = fix_asset_paths(html);
        assert_eq!(fix_asset_paths(&once), once);
    }

    #[test]
    fn strips_crossorigin_after_module_and_stylesheet() {
        let html = concat!(
            r#"<script type="module" crossorigin src="../assets/js/menu.js"></script>"#,
            r#"<link rel="stylesheet" crossorigin href="../assets/css/app.css">"#,
        );

        assert_eq!(
            strip_crossorigin(html),
            concat!(
                r#"<script type="module" src="../assets/js/menu.js"></script>"#,
                r#"<link rel="stylesheet" href="../assets/css/app.css">"#,
            )
        );
    }

    #[test]
    fn strips_valued_crossorigin() {
        assert_eq!(
            strip_crossorigin(r#"<script type="module" crossorigin="anonymous" src="a.js">"#),
            r#"<script type="module" src="a.js">"#
        );
    }

    #[test]
    fn keeps_crossorigin_elsewhere() {
        let html = r#"<img crossorigin src="a.png"><link rel="preload" crossorigin href="f.woff2">"#;
        assert_eq!(strip_crossorigin(html), html);
    }

    #[test]
    fn finalizes_vite_style_output() {
        let html = r#"<script type="module" crossorigin src="../../assets/js/menu.js"></script>"#;
        assert_eq!(
            finalize_markup(html),
            r#"<script type="module" src="../assets/js/menu.js"></script>"#
        );
    }
}
