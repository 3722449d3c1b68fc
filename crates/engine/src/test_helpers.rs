// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by engine tests

use crate::sim::{PackageIndex, Release, SourceTree};
use keel_recipe::{parse_recipe_with_format, BuildSpec, Format};

pub const XERO_RECIPE: &str = r#"
base = "python:3.13-slim"
timezone = "America/Los_Angeles"

[identity]
name = "xero"
comment = "Xero API user"

[image]
command = ["python", "xero_api_test.py"]
"#;

pub const REQUIREMENTS: &str = "flask==3.0.3\nrequests>=2.31\n";

/// Build spec from TOML recipe text.
pub fn spec_from(recipe: &str) -> BuildSpec {
    parse_recipe_with_format(recipe, Format::Toml).unwrap().validate().unwrap()
}

pub fn xero_spec() -> BuildSpec {
    spec_from(XERO_RECIPE)
}

pub fn xero_source() -> SourceTree {
    SourceTree::new()
        .with_file("requirements.txt", REQUIREMENTS)
        .with_file("xero_api_test.py", "print('hello xero')\n")
        .with_file("lib/client.py", "API = 'https://api.xero.com'\n")
}

pub fn flask_index() -> PackageIndex {
    PackageIndex::new()
        .with_release(
            "flask",
            Release::new("3.0.3")
                .requires("Werkzeug>=3.0.0")
                .requires("Jinja2>=3.1.2")
                .requires("click>=8.1.3")
                .script("flask"),
        )
        .with_release("flask", Release::new("2.3.3").script("flask"))
        .with_package("werkzeug", &["3.0.3", "2.3.8"])
        .with_package("jinja2", &["3.1.4"])
        .with_package("click", &["8.1.7"])
        .with_release("requests", Release::new("2.32.3").requires("urllib3<3,>=1.21.1"))
        .with_package("urllib3", &["2.2.2", "1.26.19"])
}
