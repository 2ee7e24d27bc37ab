//! A small in-memory LDAP directory.
//!
//! Entries are loaded from a YAML users document into a [`Directory`], which
//! can authenticate simple binds against `{SSHA}` hashed passwords and answer
//! searches using a subset of the RFC4515 filter syntax: `(&...)`, `(|...)`,
//! `(!...)` and `(attr=value)` with `*` wildcards.
//!
//! The directory is reloadable while in use. Every reload builds a complete
//! new set of entries and publishes it in one step, so a bind or search always
//! sees either the old or the new entries, never a mixture. A reload that fails
//! leaves the current entries in place.
//!
//! Talking LDAP on the wire is left to the caller: [`SearchService`] accepts
//! already decoded requests and produces `ldap3` result types ready to be
//! encoded.
//!
//! # Getting started
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use ldap_directory::{
//!     config::{Config, ReloadConfig},
//!     service::{SearchRequest, SearchService},
//!     Directory,
//! };
//!
//! let config = Config {
//!     base_dn: "dc=example,dc=org".to_owned(),
//!     users_file: "users.yaml".into(),
//!     reload: ReloadConfig { enabled: true, interval: 10 },
//! };
//!
//! let directory = Directory::new(config);
//! directory.reload().await?;
//!
//! let watcher = directory.clone();
//! tokio::spawn(async move { watcher.watch().await });
//!
//! let service = SearchService::new(directory);
//! let bind = service.bind("cn=alice,ou=users,dc=example,dc=org", "secret");
//! println!("Bind result: {}", bind.rc);
//!
//! let request = SearchRequest {
//!     base: "dc=example,dc=org".to_owned(),
//!     filter: "(&(objectClass=inetOrgPerson)(uid=a*))".to_owned(),
//! };
//! for entry in service.search("cn=alice,ou=users,dc=example,dc=org", &request).entries {
//!     println!("Found {}", entry.dn);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The users document lists one mapping per entry. `dn` is required, every
//! other key becomes an attribute with one value, or several if given a list.
//! Plain text `userPassword` values are hashed while loading:
//! ```yaml
//! users:
//!   - dn: cn=alice,ou=users,dc=example,dc=org
//!     uid: alice
//!     objectClass: [inetOrgPerson, posixAccount]
//!     userPassword: "{SSHA}I8wq1+4gyJVJUtQW96JGcmCL46ADyPnW"
//! ```
//!
//! # Limitations
//! * No schema checking: any attribute name is accepted.
//! * Only equality assertions with wildcards are understood, no substring,
//!   ordering, approximate or extensible matches. Values can't contain escaped
//!   parentheses.
//! * Only `{SSHA}` passwords are supported.

pub mod config;
pub mod directory;
pub mod entry;
pub mod error;
pub mod filter;
pub mod password;
pub mod service;

pub use ldap3::{self, LdapResult, SearchEntry};

pub use crate::{
	config::{Config, ReloadConfig},
	directory::{BindOutcome, Directory, Snapshot},
	entry::{Attribute, Entry},
	error::{Condition, Error},
	filter::{Filter, Pattern},
	service::{SearchRequest, SearchResult, SearchService},
};
