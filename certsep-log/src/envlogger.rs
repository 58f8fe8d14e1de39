//! `RUST_LOG`-style level filtering for slog drains.

use slog::{Drain, Level, OwnedKVList, Record};
use std::{env, str::FromStr};

struct Directive {
    prefix: Option<String>,
    level: Level,
}

impl Directive {
    #[inline]
    fn applies_to(&self, module: &str) -> bool {
        self.prefix
            .as_deref()
            .map_or(true, |prefix| module.starts_with(prefix))
    }
}

struct Directives(Vec<Directive>);

impl Directives {
    /// The last matching directive wins.
    #[inline]
    fn is_enabled(&self, module: &str, level: Level) -> bool {
        self.0
            .iter()
            .filter(|directive| directive.applies_to(module))
            .last()
            .map(|directive| level <= directive.level)
            .unwrap_or_default()
    }
}

/// Parse a filter specification into a list of directives.
///
/// `module=level` or a bare `level`, comma-separated, where the module
/// is a valid module prefix and the level a supported level name
/// (`critical`, `error`, `warning`, `info`, `debug`, `trace`).
/// Invalid directives are ignored.
impl From<String> for Directives {
    fn from(spec: String) -> Self {
        let directives = spec
            .split(',')
            .filter_map(|directive| match directive.split('=').collect::<Vec<_>>().as_slice() {
                [level] => Level::from_str(level).ok().map(|level| Directive {
                    prefix: None,
                    level,
                }),
                [module, level] => {
                    if !module
                        .chars()
                        .all(|c| matches!(c, '0'..='9' | 'a'..='z' | 'A'..='Z' | ':' | '_'))
                    {
                        return None;
                    }
                    Level::from_str(level).ok().map(|level| Directive {
                        prefix: Some(module.to_string()),
                        level,
                    })
                }
                _ => None,
            })
            .collect();

        Self(directives)
    }
}

pub struct Logger<T: Drain> {
    drain: T,
    directives: Directives,
}

impl<T: Drain> Logger<T> {
    pub fn new(drain: T) -> Self {
        Self::with_default_filter(drain, "info")
    }

    pub fn with_default_filter(drain: T, filter: &str) -> Self {
        let spec = env::var("RUST_LOG").unwrap_or_else(|_| filter.to_string());

        Self {
            drain,
            directives: spec.into(),
        }
    }
}

impl<T> Drain for Logger<T>
where
    T: Drain<Ok = ()>,
{
    type Err = T::Err;
    type Ok = ();

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<(), T::Err> {
        if !self.directives.is_enabled(record.module(), record.level()) {
            return Ok(());
        }

        self.drain.log(record, values)
    }
}
