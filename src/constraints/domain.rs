//! Host name rules shared by the `email` and `url` constraints.
//!
//! Host names must end in a known top-level domain. Private TLDs listed under
//! `customTLDs` are rewritten to [`SYNTHETIC_SUFFIX`] before the check, so
//! `db.corp` passes once `corp` is declared.

use crate::core::Value;
use std::collections::{BTreeMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

/// Suffix substituted for a matching custom TLD.
pub const SYNTHETIC_SUFFIX: &str = ".valid.com";

const GENERIC_TLDS: &str = "aero app arpa art asia biz blog cat cloud club com coop dev edu \
    email gov info int jobs link live mil mobi museum name net news online org page post pro \
    shop site store tech tel travel xxx xyz";

const COUNTRY_TLDS: &str = "ac ad ae af ag ai al am ao aq ar as at au aw ax az ba bb bd be bf \
    bg bh bi bj bm bn bo br bs bt bw by bz ca cc cd cf cg ch ci ck cl cm cn co cr cu cv cw cx cy \
    cz de dj dk dm do dz ec ee eg er es et eu fi fj fk fm fo fr ga gb gd ge gf gg gh gi gl gm gn \
    gp gq gr gs gt gu gw gy hk hm hn hr ht hu id ie il im in io iq ir is it je jm jo jp ke kg kh \
    ki km kn kp kr kw ky kz la lb lc li lk lr ls lt lu lv ly ma mc md me mg mh mk ml mm mn mo mp \
    mq mr ms mt mu mv mw mx my mz na nc ne nf ng ni nl no np nr nu nz om pa pe pf pg ph pk pl pm \
    pn pr ps pt pw py qa re ro rs ru rw sa sb sc sd se sg sh si sk sl sm sn so sr ss st su sv sx \
    sy sz tc td tf tg th tj tk tl tm tn to tr tt tv tw tz ua ug uk us uy uz va vc ve vg vi vn vu \
    wf ws ye yt za zm zw";

const LOCAL_TLDS: &[&str] = &["localdomain", "localhost"];

static KNOWN_TLDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    GENERIC_TLDS
        .split_whitespace()
        .chain(COUNTRY_TLDS.split_whitespace())
        .collect()
});

/// Whether `tld` (without the leading dot) is a public top-level domain.
pub fn is_known_tld(tld: &str) -> bool {
    KNOWN_TLDS.contains(tld.to_ascii_lowercase().as_str())
}

/// Host acceptance settings parsed from an `email` / `url` expectation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRules {
    /// Accept `localhost`, local-only TLDs and single-label hosts.
    pub allow_local: bool,
    /// Private TLDs, lower-case, without a leading dot.
    pub custom_tlds: Vec<String>,
}

impl DomainRules {
    /// Parse the boolean or map form.
    ///
    /// Returns `Some(None)` for `false` (check disabled) and `None` for a
    /// malformed expectation. `extra_keys` are map keys the caller handles.
    pub(crate) fn parse(
        expectation: &Value,
        extra_keys: &[&str],
    ) -> Option<Option<(Self, BTreeMap<String, Value>)>> {
        match expectation {
            Value::Bool(true) => Some(Some((Self::default(), BTreeMap::new()))),
            Value::Bool(false) => Some(None),
            Value::Map(map) => {
                let mut rules = Self::default();
                let mut extras = BTreeMap::new();
                for (key, value) in map {
                    match (key.as_str(), value) {
                        ("local", Value::Bool(local)) => rules.allow_local = *local,
                        ("customTLDs", Value::List(items)) => {
                            rules.custom_tlds = items
                                .iter()
                                .map(|item| {
                                    item.as_str().map(|tld| {
                                        tld.trim().trim_start_matches('.').to_ascii_lowercase()
                                    })
                                })
                                .collect::<Option<Vec<_>>>()?;
                        }
                        (other, _) if extra_keys.contains(&other) => {
                            extras.insert(other.to_string(), value.clone());
                        }
                        _ => return None,
                    }
                }
                Some(Some((rules, extras)))
            }
            _ => None,
        }
    }

    /// Replace a matching custom TLD suffix with [`SYNTHETIC_SUFFIX`].
    pub fn rewrite_custom_tld(&self, host: &str) -> String {
        let lower = host.to_ascii_lowercase();
        for tld in &self.custom_tlds {
            let suffix = format!(".{}", tld);
            if lower.ends_with(&suffix) && lower.len() > suffix.len() {
                return format!("{}{}", &host[..host.len() - suffix.len()], SYNTHETIC_SUFFIX);
            }
        }
        host.to_string()
    }

    /// Validate a host name or IP literal after custom TLD rewriting.
    pub fn is_valid_host(&self, host: &str) -> bool {
        if host.parse::<Ipv4Addr>().is_ok() {
            return true;
        }
        if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            return inner.parse::<Ipv6Addr>().is_ok();
        }
        self.is_valid_domain(&self.rewrite_custom_tld(host))
    }

    fn is_valid_domain(&self, domain: &str) -> bool {
        let domain = domain.strip_suffix('.').unwrap_or(domain);
        if domain.is_empty() || domain.len() > 253 {
            return false;
        }
        let labels: Vec<&str> = domain.split('.').collect();
        if !labels.iter().all(|label| is_valid_label(label)) {
            return false;
        }
        let Some(tld) = labels.last().map(|tld| tld.to_ascii_lowercase()) else {
            return false;
        };
        if labels.len() == 1 {
            return self.allow_local;
        }
        if self.allow_local && LOCAL_TLDS.contains(&tld.as_str()) {
            return true;
        }
        tld.chars().all(|c| c.is_ascii_alphabetic()) && is_known_tld(&tld)
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
