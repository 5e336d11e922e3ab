//! Whole-package extraction: walk a package tarball, parse DESCRIPTION,
//! NAMESPACE and every `R/*.R` source, and assemble one [`PackageReport`].
//! Every failure inside a package is recorded on that package's report;
//! nothing here aborts the surrounding run.

pub mod description;
pub mod namespace;
mod report;

pub use report::{
    Description, Namespace, NamespaceCall, PackageReport, ParseError, RFileReport,
};

use std::io::Read;

use rscan_matcher::analyze_tokens;

use crate::agent::{Agent, AgentConfig, AgentStats};
use crate::fetch;

pub struct PackageParser {
    agent: Agent,
}

impl PackageParser {
    pub fn new(config: AgentConfig) -> PackageParser {
        PackageParser {
            agent: Agent::new(config),
        }
    }

    pub fn stats(&self) -> AgentStats {
        self.agent.stats
    }

    /// Fetch the tarball at `url` and extract its report. Network failure
    /// yields a report with only the fetch error filled in.
    pub fn process_url(&mut self, url: &str) -> PackageReport {
        match fetch::fetch_tarball(url) {
            Ok(mut archive) => {
                let mut report = self.process_archive(&mut archive);
                report.url = url.to_string();
                report
            }
            Err(err) => PackageReport::fetch_failure(url, &err.to_string()),
        }
    }

    pub fn process_archive<R: Read>(&mut self, archive: &mut tar::Archive<R>) -> PackageReport {
        let mut report = PackageReport::default();
        let mut has_description = false;
        let mut has_namespace = false;

        let entries = match archive.entries() {
            Ok(entries) => entries,
            Err(err) => {
                report.push_error("ARCHIVE", "", err);
                return report;
            }
        };
        for entry in entries {
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    report.push_error("ARCHIVE", "", err);
                    break;
                }
            };
            let path = match entry.path() {
                Ok(path) => path.to_string_lossy().into_owned(),
                Err(err) => {
                    report.push_error("ARCHIVE", "", err);
                    continue;
                }
            };
            // Tarball entries live under a single top-level directory named
            // after the package; strip it.
            let Some(slash) = path.find('/') else {
                continue;
            };
            let inner = path[slash..].to_string();

            if inner == "/DESCRIPTION" {
                has_description = true;
                match read_entry(&mut entry) {
                    Ok(contents) => {
                        report.description = description::parse_description(&contents)
                    }
                    Err(err) => report.push_error("DESCRIPTION", &path, err),
                }
            } else if inner == "/NAMESPACE" {
                has_namespace = true;
                self.parse_namespace(&mut report, &path, &mut entry);
            } else {
                let ext = extension_of(&inner);
                *report.file_extensions.entry(ext.clone()).or_insert(0) += 1;
                if inner.starts_with("/R/") && ext == ".r" {
                    self.parse_r_file(&mut report, &inner, &mut entry);
                }
            }
        }

        if !has_description {
            report.push_error("DESCRIPTION", "", "DESCRIPTION file not found");
        }
        if !has_namespace {
            report.push_error("NAMESPACE", "", "NAMESPACE file not found");
        }
        report
    }

    fn parse_namespace<R: Read>(
        &mut self,
        report: &mut PackageReport,
        path: &str,
        entry: &mut R,
    ) {
        let contents = match read_entry(entry) {
            Ok(contents) => contents,
            Err(err) => {
                report.push_error("NAMESPACE", path, err);
                return;
            }
        };
        match self.agent.parse_text(path, &contents) {
            Ok(tokens) => {
                let (ns, errors) = namespace::scan_namespace(&tokens);
                report.namespace = ns;
                report.parse_errors.extend(errors);
            }
            Err(err) => report.push_error("NAMESPACE", path, err),
        }
    }

    /// Parse one R source. The entry is spooled to a temp file so the
    /// interpreter reads it directly instead of squeezing the whole source
    /// through the command encoding.
    fn parse_r_file<R: Read>(&mut self, report: &mut PackageReport, name: &str, entry: &mut R) {
        let mut tmp = match tempfile::NamedTempFile::new() {
            Ok(tmp) => tmp,
            Err(err) => {
                report.push_error("SOURCE_R", name, err);
                return;
            }
        };
        if let Err(err) = std::io::copy(entry, tmp.as_file_mut()) {
            report.push_error("SOURCE_R", name, err);
            return;
        }
        let tmp_path = tmp.path().to_string_lossy().into_owned();

        let mut tokens = match self.agent.parse_file(name, &tmp_path) {
            Ok(tokens) => tokens,
            Err(err) => {
                report.push_error("SOURCE_R", name, err);
                return;
            }
        };
        let mut file_report = RFileReport {
            name: name.to_string(),
            n_tokens: tokens.len(),
            analysis: None,
        };
        if !tokens.is_empty() {
            match analyze_tokens(&mut tokens) {
                Ok(analysis) => file_report.analysis = Some(analysis),
                Err(err) => report.push_error("SOURCE_R", name, err),
            }
        }
        report.r_files.push(file_report);
    }
}

fn read_entry<R: Read>(entry: &mut R) -> Result<String, std::io::Error> {
    let mut contents = String::new();
    entry.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Lowercased extension with its dot, or `NONE`.
fn extension_of(path: &str) -> String {
    match std::path::Path::new(path).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => "NONE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::gz_tar_archive;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, *name, contents.as_bytes())
                .unwrap();
        }
        let tarball = builder.into_inner().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tarball).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn extension_normalization() {
        assert_eq!(extension_of("/man/demo.Rd"), ".rd");
        assert_eq!(extension_of("/src/a.c"), ".c");
        assert_eq!(extension_of("/INDEX"), "NONE");
    }

    // Packages without NAMESPACE or R sources never touch the interpreter,
    // so these tests run without R installed.

    #[test]
    fn description_only_package() {
        let gz = tarball(&[
            ("demo/DESCRIPTION", "Package: demo\nVersion: 0.1\n"),
            ("demo/man/demo.Rd", "\\name{demo}\n"),
        ]);
        let mut parser = PackageParser::new(AgentConfig::default());
        let mut archive = gz_tar_archive(gz.as_slice());
        let report = parser.process_archive(&mut archive);

        assert_eq!(report.description.package, "demo");
        assert_eq!(report.description.version, "0.1");
        assert_eq!(report.file_extensions.get(".rd"), Some(&1));
        // NAMESPACE missing is recorded, DESCRIPTION present is not.
        assert_eq!(report.parse_errors.len(), 1);
        assert_eq!(report.parse_errors[0].stage, "NAMESPACE");
        assert_eq!(parser.stats().starts, 0);
    }

    #[test]
    fn empty_archive_reports_both_missing() {
        let gz = tarball(&[]);
        let mut parser = PackageParser::new(AgentConfig::default());
        let mut archive = gz_tar_archive(gz.as_slice());
        let report = parser.process_archive(&mut archive);

        let stages: Vec<&str> =
            report.parse_errors.iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(stages, vec!["DESCRIPTION", "NAMESPACE"]);
    }

    #[test]
    #[ignore]
    fn full_package_with_r_source() {
        let gz = tarball(&[
            ("demo/DESCRIPTION", "Package: demo\nVersion: 0.1\n"),
            ("demo/NAMESPACE", "export(run_model)\n"),
            (
                "demo/R/model.R",
                "library(stats)\nrun_model <- function(n) rnorm(n)\n",
            ),
        ]);
        let mut parser = PackageParser::new(AgentConfig::default());
        let mut archive = gz_tar_archive(gz.as_slice());
        let report = parser.process_archive(&mut archive);

        assert!(report.parse_errors.is_empty());
        assert_eq!(report.namespace.exports, vec!["run_model"]);
        assert_eq!(report.r_files.len(), 1);
        let analysis = report.r_files[0].analysis.as_ref().unwrap();
        assert_eq!(analysis.library.namespaces_used, vec!["stats"]);
        assert_eq!(analysis.function_def.functions[0].assigned_name, "run_model");
    }
}
