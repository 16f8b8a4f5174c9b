//! `G_MUST_NOT`: negative constraints from the DoD.
//!
//! `constraints.auth: none` and `constraints.db: none` forbid authentication
//! and database stacks. The project's dependency manifests, compose file and
//! env files are scanned against fixed denylists; each hit is one violation.

use camino::Utf8Path;
use regex::Regex;
use serde_json::json;
use std::fs;
use std::sync::LazyLock;

use pipeforge_dod::DodMetadata;

use crate::types::{GateId, GateResult, Violation};

pub const RULE_NO_AUTH: &str = "MUST NOT add authentication";
pub const RULE_NO_DB: &str = "MUST NOT add database";

const ENV_FILES: [&str; 4] = [".env", ".env.example", ".env.local", ".env.sample"];

static COMPOSE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*image:\s*["']?([^\s"']+)"#).expect("compose image pattern is valid")
});

/// One forbidden capability and what betrays it.
struct Denylist {
    constraint: &'static str,
    rule: &'static str,
    packages: &'static [&'static str],
    services: &'static [&'static str],
    /// Exact names, or prefixes when ending in `*`
    env_vars: &'static [&'static str],
}

const DENYLISTS: [Denylist; 2] = [
    Denylist {
        constraint: "auth",
        rule: RULE_NO_AUTH,
        packages: &[
            "jsonwebtoken",
            "passport",
            "passport-jwt",
            "passport-local",
            "bcrypt",
            "bcryptjs",
            "next-auth",
            "@auth/core",
            "express-session",
            "auth0",
            "@auth0/auth0-react",
            "@clerk/nextjs",
            "jose",
            "pyjwt",
            "python-jose",
            "passlib",
            "authlib",
            "flask-login",
            "flask-jwt-extended",
            "django-allauth",
            "djangorestframework-simplejwt",
        ],
        services: &["keycloak", "authelia", "oauth2-proxy"],
        env_vars: &[
            "JWT_SECRET",
            "AUTH_SECRET",
            "SESSION_SECRET",
            "NEXTAUTH_SECRET",
            "NEXTAUTH_URL",
            "OAUTH_*",
            "AUTH0_*",
            "CLERK_*",
        ],
    },
    Denylist {
        constraint: "db",
        rule: RULE_NO_DB,
        packages: &[
            "pg",
            "postgres",
            "mysql",
            "mysql2",
            "mongodb",
            "mongoose",
            "sequelize",
            "typeorm",
            "prisma",
            "@prisma/client",
            "drizzle-orm",
            "knex",
            "sqlite3",
            "better-sqlite3",
            "redis",
            "ioredis",
            "psycopg2",
            "psycopg2-binary",
            "psycopg",
            "asyncpg",
            "sqlalchemy",
            "pymongo",
            "mysqlclient",
            "peewee",
        ],
        services: &["postgres", "mysql", "mariadb", "mongo", "redis"],
        env_vars: &[
            "DATABASE_URL",
            "DB_HOST",
            "DB_USER",
            "DB_PASSWORD",
            "DB_NAME",
            "MONGO_URI",
            "MONGODB_URI",
            "REDIS_URL",
            "POSTGRES_*",
            "MYSQL_*",
        ],
    },
];

/// Dependencies, services and env vars present in a project.
#[derive(Debug, Default)]
struct ProjectInventory {
    /// `(source, package name)`
    packages: Vec<(String, String)>,
    services: Vec<String>,
    /// `(file, variable name)`
    env_vars: Vec<(String, String)>,
}

/// Scan `project` against every denylist the DoD activates.
#[must_use]
pub fn check_must_not(project: &Utf8Path, metadata: &DodMetadata) -> (GateResult, Vec<Violation>) {
    let active: Vec<&Denylist> = DENYLISTS
        .iter()
        .filter(|d| metadata.forbids(d.constraint))
        .collect();

    if active.is_empty() {
        return (
            GateResult::new(GateId::MustNot, true, "No negative constraints declared"),
            Vec::new(),
        );
    }

    let inventory = ProjectInventory::scan(project);
    let violations: Vec<Violation> = active
        .iter()
        .flat_map(|denylist| find_violations(denylist, &inventory))
        .collect();

    let rules: Vec<&str> = active.iter().map(|d| d.rule).collect();
    let gate = if violations.is_empty() {
        GateResult::new(
            GateId::MustNot,
            true,
            format!("No violations of {} constraint(s)", rules.len()),
        )
    } else {
        GateResult::new(
            GateId::MustNot,
            false,
            format!("{} constraint violation(s) found", violations.len()),
        )
        .with_details(json!({ "rules": rules, "violations": violations.len() }))
    };

    (gate, violations)
}

fn find_violations(denylist: &Denylist, inventory: &ProjectInventory) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (source, package) in &inventory.packages {
        if denylist.packages.contains(&package.as_str()) {
            violations.push(Violation {
                kind: "dependency".to_string(),
                rule: denylist.rule.to_string(),
                detail: format!("{source}: {package}"),
            });
        }
    }

    for image in &inventory.services {
        if denylist.services.iter().any(|s| image_is(image, s)) {
            violations.push(Violation {
                kind: "service".to_string(),
                rule: denylist.rule.to_string(),
                detail: format!("docker-compose.yml: image {image}"),
            });
        }
    }

    for (file, var) in &inventory.env_vars {
        if denylist.env_vars.iter().any(|pattern| env_matches(pattern, var)) {
            violations.push(Violation {
                kind: "env_var".to_string(),
                rule: denylist.rule.to_string(),
                detail: format!("{file}: {var}"),
            });
        }
    }

    violations
}

impl ProjectInventory {
    fn scan(project: &Utf8Path) -> Self {
        let mut inventory = Self::default();

        if let Some(text) = read(project, "package.json") {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(manifest) => {
                    for section in ["dependencies", "devDependencies"] {
                        if let Some(deps) = manifest.get(section).and_then(|v| v.as_object()) {
                            inventory.packages.extend(
                                deps.keys()
                                    .map(|name| (format!("package.json {section}"), name.clone())),
                            );
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "package.json is not valid JSON; skipped"),
            }
        }

        if let Some(text) = read(project, "requirements.txt") {
            inventory.packages.extend(
                text.lines()
                    .filter_map(requirement_name)
                    .map(|name| ("requirements.txt".to_string(), name)),
            );
        }

        for compose in ["docker-compose.yml", "docker-compose.yaml", "compose.yml"] {
            if let Some(text) = read(project, compose) {
                inventory.services.extend(
                    text.lines()
                        .filter_map(|line| COMPOSE_IMAGE.captures(line))
                        .map(|caps| caps[1].to_lowercase()),
                );
            }
        }

        for env_file in ENV_FILES {
            if let Some(text) = read(project, env_file) {
                inventory.env_vars.extend(
                    text.lines()
                        .filter_map(env_var_name)
                        .map(|var| (env_file.to_string(), var)),
                );
            }
        }

        inventory
    }
}

fn read(project: &Utf8Path, name: &str) -> Option<String> {
    fs::read_to_string(project.join(name)).ok()
}

/// Normalized package name from one `requirements.txt` line.
fn requirement_name(line: &str) -> Option<String> {
    let line = line.split('#').next()?.trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .unwrap_or(line.len());
    let name = &line[..end];
    (!name.is_empty()).then(|| name.to_lowercase().replace('_', "-"))
}

fn env_var_name(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (name, _) = line.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn env_matches(pattern: &str, var: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => var.starts_with(prefix),
        None => var == pattern,
    }
}

/// `image` names `service`, ignoring registry, namespace and tag.
fn image_is(image: &str, service: &str) -> bool {
    let without_tag = image.split(['@', ':']).next().unwrap_or(image);
    let base = without_tag.rsplit('/').next().unwrap_or(without_tag);
    base == service
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pipeforge_dod::parse_front_matter;
    use tempfile::TempDir;

    fn meta(auth: &str, db: &str) -> DodMetadata {
        parse_front_matter(&format!(
            "---\nconstraints:\n  auth: {auth}\n  db: {db}\n---\n"
        ))
        .unwrap()
    }

    fn project(files: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        for (name, content) in files {
            fs::write(root.join(name), content).unwrap();
        }
        (temp, root)
    }

    #[test]
    fn test_jsonwebtoken_is_exactly_one_auth_violation() {
        let (_t, root) = project(&[(
            "package.json",
            r#"{"dependencies": {"express": "^4.0.0", "jsonwebtoken": "^9.0.0"}}"#,
        )]);

        let (gate, violations) = check_must_not(&root, &meta("none", "none"));

        assert!(!gate.passed());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RULE_NO_AUTH);
        assert_eq!(violations[0].kind, "dependency");
        assert!(violations[0].detail.contains("jsonwebtoken"));
    }

    #[test]
    fn test_commented_constraint_still_enforced() {
        let (_t, root) = project(&[(
            "package.json",
            r#"{"dependencies": {"jsonwebtoken": "^9.0.0"}}"#,
        )]);

        let (gate, violations) = check_must_not(&root, &meta("none  # no login in MVP", "sqlite"));

        assert!(!gate.passed());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RULE_NO_AUTH);
    }

    #[test]
    fn test_constraints_not_forbidding_skip_scan() {
        let (_t, root) = project(&[("package.json", r#"{"dependencies": {"pg": "8"}}"#)]);
        let (gate, violations) = check_must_not(&root, &meta("jwt", "postgres"));
        assert!(gate.passed());
        assert!(violations.is_empty());
        assert_eq!(gate.message, "No negative constraints declared");
    }

    #[test]
    fn test_requirements_compose_and_env() {
        let (_t, root) = project(&[
            ("requirements.txt", "flask==3.0\nSQLAlchemy>=2  # orm\n-r base.txt\n"),
            (
                "docker-compose.yml",
                "services:\n  db:\n    image: \"postgres:16-alpine\"\n  web:\n    image: node:20\n",
            ),
            (".env.example", "# comment\nPORT=3000\nexport DATABASE_URL=postgres://x\n"),
        ]);

        let (_, violations) = check_must_not(&root, &meta("none", "none"));
        let details: Vec<&str> = violations.iter().map(|v| v.detail.as_str()).collect();

        assert_eq!(
            details,
            vec![
                "requirements.txt: sqlalchemy",
                "docker-compose.yml: image postgres:16-alpine",
                ".env.example: DATABASE_URL",
            ]
        );
        assert!(violations.iter().all(|v| v.rule == RULE_NO_DB));
    }

    #[test]
    fn test_env_prefix_patterns() {
        assert!(env_matches("POSTGRES_*", "POSTGRES_PASSWORD"));
        assert!(!env_matches("DB_HOST", "DB_HOSTNAME"));
    }

    #[test]
    fn test_image_base_name() {
        assert!(image_is("docker.io/library/redis:7", "redis"));
        assert!(!image_is("redis-commander:latest", "redis"));
    }

    #[test]
    fn test_clean_project_passes() {
        let (_t, root) = project(&[("package.json", r#"{"dependencies": {"express": "4"}}"#)]);
        let (gate, violations) = check_must_not(&root, &meta("none", "none"));
        assert!(gate.passed());
        assert!(violations.is_empty());
    }
}
