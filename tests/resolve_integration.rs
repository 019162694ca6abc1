//! Integration tests resolving assets against the real filesystem.

mod common;

use asset_cache::config::{Config, Settings};
use asset_cache::error::Error;
use asset_cache::factory::AssetFactory;
use common::prelude::*;
use std::path::PathBuf;

fn factory(fixture: &TestFixture) -> AssetFactory {
    factory_with(fixture, Config::default())
}

fn factory_with(fixture: &TestFixture, config: Config) -> AssetFactory {
    let settings =
        Settings::new(fixture.site_root(), Some(fixture.cache_dir())).with_config(config);
    AssetFactory::new(settings).unwrap()
}

fn plain() -> Config {
    Config {
        minify_scripts: false,
        minify_styles: false,
        escape_markup: false,
    }
}

#[test]
fn test_include_scenario_and_cache_file() {
    let fixture = TestFixture::new().with_main_scenario();

    let mut asset = factory(&fixture).resolve(fixture.site("main.js")).unwrap();
    assert_eq!(asset.content().unwrap(), "var x = 1;\nconsole.log(1);");
    assert_eq!(
        asset.dependencies().unwrap(),
        vec![fixture.site("lib/common.js"), fixture.site("main.js")]
    );
    assert!(!asset.is_from_cache());

    let cache_files = fixture.cache_files();
    assert_eq!(cache_files.len(), 2);

    let cache_text = std::fs::read_to_string(asset.cache_path().unwrap()).unwrap();
    let (header, body) = cache_text.split_once("\n\n").unwrap();
    assert!(header.starts_with("/*# Configuration: "));
    assert!(header.contains(&format!(
        "/*# Reference: {} | /lib/common.js */",
        fixture.site("lib/common.js").display()
    )));
    assert_eq!(body, "var x = 1;\nconsole.log(1);");
}

#[test]
fn test_second_resolve_is_served_from_cache() {
    let fixture = TestFixture::new().with_main_scenario();
    let factory = factory(&fixture);

    let mut first = factory.resolve(fixture.site("main.js")).unwrap();
    let mut second = factory.resolve(fixture.site("main.js")).unwrap();

    assert!(second.is_from_cache());
    assert_eq!(first.content().unwrap(), second.content().unwrap());
    assert_eq!(first.dependencies().unwrap(), second.dependencies().unwrap());
}

#[test]
fn test_corrupt_cache_file_is_rebuilt() {
    let fixture = TestFixture::new().with_main_scenario();
    let factory = factory(&fixture);
    let first = factory.resolve(fixture.site("main.js")).unwrap();
    let cache_path = first.cache_path().unwrap().to_path_buf();

    std::fs::write(&cache_path, [0xff, 0xfe, 0xfd]).unwrap();

    let mut asset = factory.resolve(fixture.site("main.js")).unwrap();
    assert!(!asset.is_from_cache());
    assert_eq!(asset.content().unwrap(), "var x = 1;\nconsole.log(1);");

    let rewritten = std::fs::read_to_string(&cache_path).unwrap();
    assert!(rewritten.ends_with("\n\nvar x = 1;\nconsole.log(1);"));
}

#[test]
fn test_case_variant_files_get_separate_cache_files() {
    let fixture = TestFixture::new()
        .with_file("site/a.js", "lower();")
        .with_file("site/A.js", "UPPER();");
    if std::fs::read_to_string(fixture.site("a.js")).unwrap() != "lower();" {
        // case-insensitive filesystem
        return;
    }
    let factory = factory_with(&fixture, plain());

    let mut lower = factory.resolve(fixture.site("a.js")).unwrap();
    let mut upper = factory.resolve(fixture.site("A.js")).unwrap();

    assert_eq!(lower.content().unwrap(), "lower();");
    assert_eq!(upper.content().unwrap(), "UPPER();");
    assert_ne!(lower.cache_path(), upper.cache_path());
}

#[test]
fn test_touching_include_rebuilds() {
    let fixture = TestFixture::new().with_main_scenario();
    let factory = factory(&fixture);
    factory.resolve(fixture.site("main.js")).unwrap();

    fixture.write("site/lib/common.js", "var x = 2;");
    fixture.touch("site/lib/common.js");

    let mut asset = factory.resolve(fixture.site("main.js")).unwrap();
    assert!(!asset.is_from_cache());
    assert_eq!(asset.content().unwrap(), "var x = 2;\nconsole.log(1);");
}

#[test]
fn test_configuration_change_rebuilds() {
    let fixture = TestFixture::new()
        .with_file("site/style.css", "body {\n  margin: 0;\n}\n");

    let mut minified = factory(&fixture).resolve(fixture.site("style.css")).unwrap();
    assert_eq!(minified.content().unwrap(), "body{margin:0;}");

    let mut plain_asset = factory_with(&fixture, plain())
        .resolve(fixture.site("style.css"))
        .unwrap();
    assert!(!plain_asset.is_from_cache());
    assert_eq!(plain_asset.content().unwrap(), "body {\n  margin: 0;\n}");
}

#[test]
fn test_deleting_dependency_invalidates_cache() {
    let fixture = TestFixture::new().with_main_scenario();
    let factory = factory(&fixture);
    factory.resolve(fixture.site("main.js")).unwrap();

    std::fs::remove_file(fixture.site("lib/common.js")).unwrap();

    let mut asset = factory.resolve(fixture.site("main.js")).unwrap();
    assert!(!asset.is_from_cache());
    assert!(asset
        .content()
        .unwrap()
        .contains("/*# include: lib/common.js */ /* File not found */"));
}

#[test]
fn test_recursive_inclusion_fails() {
    let fixture = TestFixture::new()
        .with_file("site/a.js", sources::CYCLE_A)
        .with_file("site/b.js", sources::CYCLE_B);

    let err = factory(&fixture).resolve(fixture.site("a.js")).unwrap_err();
    match err {
        Error::RecursiveInclusion { cycle } => {
            let names: Vec<&str> = cycle.split(" -> ").collect();
            assert_eq!(names.len(), 3);
            assert!(names[0].ends_with("/a.js"));
            assert!(names[1].ends_with("/b.js"));
            assert!(names[2].ends_with("/a.js"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_inclusion_fails() {
    let fixture = TestFixture::new().with_file("site/self.js", sources::SELF_JS);

    let err = factory(&fixture).resolve(fixture.site("self.js")).unwrap_err();
    assert!(matches!(err, Error::SelfInclusion { .. }));
}

#[test]
fn test_missing_include_is_marked() {
    let fixture = TestFixture::new().with_file("site/m.js", sources::MISSING_JS);

    let mut asset = factory_with(&fixture, plain())
        .resolve(fixture.site("m.js"))
        .unwrap();
    assert_eq!(
        asset.content().unwrap(),
        "/*# include: gone.js */ /* File not found */\nafter();"
    );
    assert_eq!(asset.includes().unwrap().len(), 1);
    assert_eq!(asset.dependencies().unwrap(), vec![fixture.site("m.js")]);
}

#[test]
fn test_equivalent_include_paths_share_identity() {
    let fixture = TestFixture::new()
        .with_file(
            "site/main.js",
            "/*# include: lib.js */\n/*# include: ./lib.js */\n/*# include: sub/../lib.js?v=2 */",
        )
        .with_file("site/lib.js", "lib();");

    let mut asset = factory_with(&fixture, plain())
        .resolve(fixture.site("main.js"))
        .unwrap();
    assert_eq!(asset.includes().unwrap().len(), 1);
    assert_eq!(asset.dependencies().unwrap().len(), 2);
}

#[test]
fn test_rooted_include_uses_site_root() {
    let fixture = TestFixture::new()
        .with_file("site/js/deep/app.js", "/*# include: /shared/util.js */\napp();")
        .with_file("site/shared/util.js", "util();");

    let mut asset = factory_with(&fixture, plain())
        .resolve(fixture.site("js/deep/app.js"))
        .unwrap();
    assert_eq!(asset.content().unwrap(), "util();\napp();");
}

#[test]
fn test_resolve_all_in_parallel() {
    let fixture = TestFixture::new().with_main_scenario();
    for i in 0..8 {
        fixture.write(
            &format!("site/page{i}.js"),
            &format!("/*# include: main.js */\npage{i}();"),
        );
    }
    let paths: Vec<PathBuf> = (0..8).map(|i| fixture.site(&format!("page{i}.js"))).collect();

    let results = factory_with(&fixture, plain()).resolve_all(&paths);
    for (i, result) in results.into_iter().enumerate() {
        let mut asset = result.unwrap();
        assert_eq!(
            asset.content().unwrap(),
            format!("var x = 1;\nconsole.log(1);\npage{i}();")
        );
        assert_eq!(asset.dependencies().unwrap().len(), 3);
    }
}

#[test]
fn test_without_cache_dir_nothing_is_written() {
    let fixture = TestFixture::new().with_main_scenario();
    let factory = AssetFactory::new(Settings::new(fixture.site_root(), None)).unwrap();

    let mut asset = factory.resolve(fixture.site("main.js")).unwrap();
    assert_eq!(asset.content().unwrap(), "var x = 1;\nconsole.log(1);");
    assert!(asset.cache_path().is_none());
    assert!(fixture.cache_files().is_empty());
}

#[test]
fn test_repeated_initialize_is_idempotent() {
    let fixture = TestFixture::new().with_main_scenario();
    let mut asset = factory(&fixture).create(fixture.site("main.js")).unwrap();

    asset.initialize().unwrap();
    let content = asset.content().unwrap().to_string();
    let deps = asset.dependencies().unwrap();

    asset.initialize().unwrap();
    assert!(asset.is_from_cache());
    assert_eq!(asset.content().unwrap(), content);
    assert_eq!(asset.dependencies().unwrap(), deps);
}
