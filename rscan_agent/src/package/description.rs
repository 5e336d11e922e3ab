//! DESCRIPTION file parser.
//!
//! The format is `Field: value` with indented continuation lines. Fields
//! we know land in [`Description`]; anything else is ignored. Dependency
//! lists split on commas and drop `(>= x.y)` version constraints.

use std::sync::OnceLock;

use regex::Regex;

use super::report::Description;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w@.]+):\s+(.*)$").expect("static pattern"))
}

fn constraint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w.]+)\s*\((.+)\)$").expect("static pattern"))
}

pub fn parse_description(input: &str) -> Description {
    let mut desc = Description::default();
    let mut field_name = String::new();
    let mut field_value = String::new();

    for line in input.lines() {
        if let Some(captures) = header_re().captures(line) {
            if !field_name.is_empty() {
                set_field(&mut desc, &field_name, field_value.trim());
            }
            field_name = captures[1].to_string();
            field_value = captures[2].to_string();
        } else {
            field_value.push(' ');
            field_value.push_str(line.trim());
        }
    }
    if !field_name.is_empty() {
        set_field(&mut desc, &field_name, field_value.trim());
    }
    desc
}

fn set_field(desc: &mut Description, name: &str, value: &str) {
    match name.to_ascii_lowercase().as_str() {
        "package" => desc.package = value.to_string(),
        "title" => desc.title = value.to_string(),
        "version" => desc.version = value.to_string(),
        "license" => desc.license = value.to_string(),
        "description" => desc.description = value.to_string(),
        "imports" => desc.imports = split_package_list(value),
        "depends" => desc.depends = split_package_list(value),
        "suggests" => desc.suggests = split_package_list(value),
        "biocviews" => desc.bioc_views = split_package_list(value),
        _ => {}
    }
}

fn split_package_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            match constraint_re().captures(field) {
                Some(captures) => captures[1].to_string(),
                None => field.to_string(),
            }
        })
        .collect()
}
