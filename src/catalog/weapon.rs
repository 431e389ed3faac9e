use crate::domain::{WeaponAbility, WeaponProfile};

pub const DEFAULT_RANGE: &str = "Melee";
pub const DEFAULT_ATTACKS: &str = "1";
pub const DEFAULT_SKILL: &str = "-";
pub const DEFAULT_STRENGTH: &str = "-";
pub const DEFAULT_ARMOUR_PENETRATION: &str = "0";
pub const DEFAULT_DAMAGE: &str = "1";

/// Build a weapon from a profile's characteristics, filling absent ones with defaults
pub fn build_weapon(name: &str, characteristics: &[(String, String)]) -> WeaponProfile {
    let lookup = |keys: &[&str], default: &str| -> String {
        characteristic(characteristics, keys)
            .unwrap_or(default)
            .to_string()
    };

    WeaponProfile {
        name: name.trim().to_string(),
        range: lookup(&["Range"], DEFAULT_RANGE),
        attacks: lookup(&["A"], DEFAULT_ATTACKS),
        skill: lookup(&["BS", "WS"], DEFAULT_SKILL),
        strength: lookup(&["S"], DEFAULT_STRENGTH),
        armour_penetration: lookup(&["AP"], DEFAULT_ARMOUR_PENETRATION),
        damage: lookup(&["D"], DEFAULT_DAMAGE),
        abilities: characteristic(characteristics, &["Keywords"])
            .map(parse_abilities)
            .unwrap_or_default(),
    }
}

fn characteristic<'a>(characteristics: &'a [(String, String)], keys: &[&str]) -> Option<&'a str> {
    characteristics
        .iter()
        .find(|(name, value)| {
            keys.iter().any(|key| name.trim().eq_ignore_ascii_case(key)) && !value.trim().is_empty()
        })
        .map(|(_, value)| value.trim())
}

/// Split a comma separated keyword line ("Assault, Rapid Fire 1") into abilities
pub fn parse_abilities(text: &str) -> Vec<WeaponAbility> {
    let mut abilities: Vec<WeaponAbility> = Vec::new();
    for part in text.split(',').map(str::trim) {
        if part.is_empty() || part == "-" {
            continue;
        }
        let ability = parse_ability(part);
        if !abilities.contains(&ability) {
            abilities.push(ability);
        }
    }
    abilities
}

pub fn parse_ability(text: &str) -> WeaponAbility {
    let lower = text.to_lowercase();
    match lower.as_str() {
        "assault" => WeaponAbility::Assault,
        "heavy" => WeaponAbility::Heavy,
        "pistol" => WeaponAbility::Pistol,
        "torrent" => WeaponAbility::Torrent,
        "lethal hits" => WeaponAbility::LethalHits,
        "devastating wounds" => WeaponAbility::DevastatingWounds,
        "twin-linked" | "twin linked" => WeaponAbility::TwinLinked,
        "ignores cover" => WeaponAbility::IgnoresCover,
        "precision" => WeaponAbility::Precision,
        "blast" => WeaponAbility::Blast,
        "hazardous" => WeaponAbility::Hazardous,
        "lance" => WeaponAbility::Lance,
        "indirect fire" => WeaponAbility::IndirectFire,
        "psychic" => WeaponAbility::Psychic,
        "extra attacks" => WeaponAbility::ExtraAttacks,
        "one shot" => WeaponAbility::OneShot,
        _ => parse_parameterised(text),
    }
}

fn parse_parameterised(text: &str) -> WeaponAbility {
    if let Some(value) = suffix_value(text, "rapid fire ") {
        return WeaponAbility::RapidFire(value);
    }
    if let Some(value) = suffix_value(text, "sustained hits ") {
        return WeaponAbility::SustainedHits(value);
    }
    if let Some(value) = suffix_value(text, "melta ") {
        return WeaponAbility::Melta(value);
    }
    if let Some(anti) = parse_anti(text) {
        return anti;
    }
    WeaponAbility::Other(text.to_string())
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    text.get(prefix.len()..)
}

fn suffix_value(text: &str, prefix: &str) -> Option<String> {
    let value = strip_prefix_ignore_case(text, prefix)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// "Anti-Vehicle 4+" -> keyword "Vehicle", threshold "4+"
fn parse_anti(text: &str) -> Option<WeaponAbility> {
    let rest = strip_prefix_ignore_case(text, "anti-")?.trim();
    let (keyword, threshold) = rest.rsplit_once(char::is_whitespace)?;
    let keyword = keyword.trim();
    let threshold = threshold.trim();
    if keyword.is_empty() || !threshold.ends_with('+') {
        return None;
    }
    Some(WeaponAbility::Anti {
        keyword: keyword.to_string(),
        threshold: threshold.to_string(),
    })
}
