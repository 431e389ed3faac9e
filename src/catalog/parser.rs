use anyhow::{bail, Result};
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::content_id::content_id;
use super::weapon::build_weapon;
use crate::domain::{UnitProfile, WeaponProfile};

/// Bump whenever a change to extraction alters units emitted for an unchanged document.
/// Stored alongside imported data; a mismatch forces a full re-import.
pub const CATALOG_FORMAT_VERSION: u32 = 3;

const ROOT_ELEMENTS: [&[u8]; 2] = [b"catalogue", b"gameSystem"];
const UNIT_ENTRY_TYPES: [&str; 2] = ["unit", "model"];
const POINT_COST_NAMES: [&str; 2] = ["pts", "points"];

/// Parse one catalog document into unit profiles.
///
/// Malformed unit entries are skipped with a warning. Fails only when the
/// document is not well-formed XML or is not a catalogue at all.
pub fn parse_catalog(xml: &str) -> Result<Vec<UnitProfile>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = CatalogState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => state.open(&e, false)?,
            Ok(Event::Empty(e)) => state.open(&e, true)?,
            Ok(Event::End(e)) => state.close(e.local_name().as_ref()),
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => state.text(&text),
                Err(err) => state.reject_current_unit(format!("unreadable text: {}", err)),
            },
            Ok(Event::Eof) => break,
            Err(e) => bail!(
                "Malformed catalog XML at position {}: {}",
                reader.buffer_position(),
                e
            ),
            _ => {}
        }
    }

    state.finish()
}

struct CatalogHeader {
    id: String,
    faction: String,
}

#[derive(Default)]
struct CatalogState {
    header: Option<CatalogHeader>,
    unit: Option<UnitBuilder>,
    units: Vec<UnitProfile>,
    skipped: usize,
}

impl CatalogState {
    fn open(&mut self, e: &BytesStart, is_empty: bool) -> Result<()> {
        let name = e.local_name();
        let name = name.as_ref();

        if self.header.is_none() {
            self.header = Some(read_header(e)?);
            return Ok(());
        }

        match name {
            b"selectionEntry" => self.open_entry(e, is_empty),
            b"cost" => self.read_cost(e),
            b"profile" => {
                if let Some(unit) = self.unit.as_mut() {
                    unit.profile = Some(ProfileBuilder {
                        name: attribute(e, "name"),
                        type_name: attribute(e, "typeName").unwrap_or_default(),
                        characteristics: Vec::new(),
                    });
                    if is_empty {
                        unit.close_profile();
                    }
                }
            }
            b"characteristic" => {
                if let Some(unit) = self.unit.as_mut() {
                    let label = attribute(e, "name").unwrap_or_default();
                    unit.characteristic = Some((label, String::new()));
                    if is_empty {
                        unit.close_characteristic();
                    }
                }
            }
            b"categoryLink" => {
                if let Some(unit) = self.unit.as_mut().filter(|u| u.depth == 1) {
                    if let Some(keyword) = attribute(e, "name") {
                        push_unique(&mut unit.keywords, keyword.trim());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn open_entry(&mut self, e: &BytesStart, is_empty: bool) {
        if let Some(unit) = self.unit.as_mut() {
            if !is_empty {
                unit.depth += 1;
            }
            return;
        }

        let entry_type = attribute(e, "type").unwrap_or_default();
        if !UNIT_ENTRY_TYPES.contains(&entry_type.as_str()) {
            return;
        }

        let builder = UnitBuilder::new(attribute(e, "id"), attribute(e, "name"));
        if is_empty {
            self.finish_unit(builder);
        } else {
            self.unit = Some(builder);
        }
    }

    fn read_cost(&mut self, e: &BytesStart) {
        let Some(unit) = self.unit.as_mut().filter(|u| u.depth == 1 && u.profile.is_none()) else {
            return;
        };
        let cost_name = attribute(e, "name").unwrap_or_default().to_lowercase();
        if !POINT_COST_NAMES.contains(&cost_name.as_str()) || unit.points.is_some() {
            return;
        }

        let value = attribute(e, "value").unwrap_or_default();
        match parse_points(&value) {
            Some(points) => unit.points = Some(points),
            None => unit.problem = Some(format!("invalid point cost {:?}", value)),
        }
    }

    fn close(&mut self, name: &[u8]) {
        let Some(unit) = self.unit.as_mut() else {
            return;
        };

        match name {
            b"selectionEntry" => {
                unit.depth -= 1;
                if unit.depth == 0 {
                    if let Some(finished) = self.unit.take() {
                        self.finish_unit(finished);
                    }
                }
            }
            b"profile" => unit.close_profile(),
            b"characteristic" => unit.close_characteristic(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, value)) = self
            .unit
            .as_mut()
            .and_then(|unit| unit.characteristic.as_mut())
        {
            value.push_str(text);
        }
    }

    fn reject_current_unit(&mut self, reason: String) {
        if let Some(unit) = self.unit.as_mut() {
            unit.problem.get_or_insert(reason);
        }
    }

    fn finish_unit(&mut self, unit: UnitBuilder) {
        let Some(header) = self.header.as_ref() else {
            return;
        };

        match unit.build(header) {
            Ok(profile) => {
                debug!("Parsed unit {} ({})", profile.name, profile.content_id);
                self.units.push(profile);
            }
            Err(reason) => {
                warn!("Skipping unit entry in catalog {}: {}", header.id, reason);
                self.skipped += 1;
            }
        }
    }

    fn finish(mut self) -> Result<Vec<UnitProfile>> {
        let Some(header) = self.header.as_ref() else {
            bail!("Catalog document has no root element");
        };

        if let Some(unit) = self.unit.take() {
            warn!(
                "Skipping unterminated unit entry {:?} in catalog {}",
                unit.name, header.id
            );
            self.skipped += 1;
        }

        if self.skipped > 0 {
            warn!(
                "Catalog {}: parsed {} units, skipped {} malformed entries",
                header.id,
                self.units.len(),
                self.skipped
            );
        }
        Ok(self.units)
    }
}

fn read_header(e: &BytesStart) -> Result<CatalogHeader> {
    let root = e.local_name();
    if !ROOT_ELEMENTS.contains(&root.as_ref()) {
        bail!(
            "Not a catalog document: root element <{}>",
            String::from_utf8_lossy(root.as_ref())
        );
    }

    let Some(id) = attribute(e, "id").filter(|id| !id.trim().is_empty()) else {
        bail!("Catalog root element has no id attribute");
    };

    Ok(CatalogHeader {
        id,
        faction: attribute(e, "name").unwrap_or_else(|| "Unknown".to_string()),
    })
}

struct ProfileBuilder {
    name: Option<String>,
    type_name: String,
    characteristics: Vec<(String, String)>,
}

struct UnitBuilder {
    entry_id: Option<String>,
    name: Option<String>,
    /// selectionEntry nesting below and including the unit itself
    depth: usize,
    points: Option<u32>,
    weapons: Vec<WeaponProfile>,
    keywords: Vec<String>,
    abilities: Vec<String>,
    profile: Option<ProfileBuilder>,
    characteristic: Option<(String, String)>,
    problem: Option<String>,
}

impl UnitBuilder {
    fn new(entry_id: Option<String>, name: Option<String>) -> Self {
        Self {
            entry_id,
            name,
            depth: 1,
            points: None,
            weapons: Vec::new(),
            keywords: Vec::new(),
            abilities: Vec::new(),
            profile: None,
            characteristic: None,
            problem: None,
        }
    }

    fn close_characteristic(&mut self) {
        let Some(characteristic) = self.characteristic.take() else {
            return;
        };
        if let Some(profile) = self.profile.as_mut() {
            profile.characteristics.push(characteristic);
        }
    }

    fn close_profile(&mut self) {
        let Some(profile) = self.profile.take() else {
            return;
        };
        let type_name = profile.type_name.to_lowercase();
        let name = profile.name.as_deref().map(str::trim).unwrap_or_default();

        if type_name.contains("weapon") {
            if name.is_empty() {
                warn!("Skipping unnamed weapon profile in unit {:?}", self.name);
                return;
            }
            if !self.weapons.iter().any(|w| w.name == name) {
                self.weapons.push(build_weapon(name, &profile.characteristics));
            }
        } else if type_name.contains("abilit") && !name.is_empty() {
            push_unique(&mut self.abilities, name);
        }
    }

    fn build(self, header: &CatalogHeader) -> std::result::Result<UnitProfile, String> {
        if let Some(problem) = self.problem {
            return Err(problem);
        }
        let entry_id = self
            .entry_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| format!("unit {:?} has no id", self.name))?;
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| format!("unit {} has no name", entry_id))?;

        Ok(UnitProfile {
            content_id: content_id(&header.id, &entry_id),
            name,
            faction: header.faction.clone(),
            weapons: self.weapons,
            keywords: self.keywords,
            abilities: self.abilities,
            points: self.points.unwrap_or(0),
        })
    }
}

fn attribute(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn parse_points(value: &str) -> Option<u32> {
    let points: f64 = value.trim().parse().ok()?;
    if !points.is_finite() || points < 0.0 {
        return None;
    }
    Some(points.round() as u32)
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeaponAbility;

    const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalogue id="sm-cat" name="Imperium - Space Marines" revision="12" xmlns="http://www.battlescribe.net/schema/catalogueSchema">
  <sharedSelectionEntries>
    <selectionEntry type="unit" id="intercessors" name="Intercessor Squad">
      <costs>
        <cost name="pts" typeId="points" value="90.0"/>
      </costs>
      <categoryLinks>
        <categoryLink id="c1" name="Infantry" targetId="x"/>
        <categoryLink id="c2" name="Battleline" targetId="y"/>
      </categoryLinks>
      <profiles>
        <profile id="p1" name="Oath of Moment" typeName="Abilities">
          <characteristics>
            <characteristic name="Description">Re-roll hits.</characteristic>
          </characteristics>
        </profile>
      </profiles>
      <selectionEntries>
        <selectionEntry type="model" id="intercessor" name="Intercessor">
          <costs>
            <cost name="pts" typeId="points" value="5"/>
          </costs>
          <profiles>
            <profile id="w1" name="Bolt rifle" typeName="Ranged Weapons">
              <characteristics>
                <characteristic name="Range">24&quot;</characteristic>
                <characteristic name="A">2</characteristic>
                <characteristic name="BS">3+</characteristic>
                <characteristic name="S">4</characteristic>
                <characteristic name="AP">-1</characteristic>
                <characteristic name="D">1</characteristic>
                <characteristic name="Keywords">Assault, Heavy</characteristic>
              </characteristics>
            </profile>
          </profiles>
        </selectionEntry>
        <selectionEntry type="model" id="sergeant" name="Intercessor Sergeant">
          <profiles>
            <profile id="w1b" name="Bolt rifle" typeName="Ranged Weapons"/>
          </profiles>
        </selectionEntry>
      </selectionEntries>
    </selectionEntry>
    <selectionEntry type="model" id="captain" name="Captain">
      <costs>
        <cost name="pts" typeId="points" value="80"/>
      </costs>
      <profiles>
        <profile id="w2" name="Power weapon" typeName="Melee Weapons">
          <characteristics>
            <characteristic name="WS">2+</characteristic>
            <characteristic name="S">5</characteristic>
            <characteristic name="Keywords">-</characteristic>
          </characteristics>
        </profile>
      </profiles>
    </selectionEntry>
    <selectionEntry type="unit" name="Nameless Id">
      <costs><cost name="pts" value="100"/></costs>
    </selectionEntry>
    <selectionEntry type="unit" id="bad-cost" name="Bad Cost Squad">
      <costs><cost name="pts" value="lots"/></costs>
    </selectionEntry>
    <selectionEntry type="upgrade" id="relic" name="Relic Blade"/>
    <selectionEntry type="unit" id="scouts" name="Scout Squad"/>
  </sharedSelectionEntries>
</catalogue>"#;

    #[test]
    fn test_parses_valid_units_and_skips_malformed() {
        let units = parse_catalog(CATALOG).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();

        assert_eq!(names, vec!["Intercessor Squad", "Captain", "Scout Squad"]);
    }

    #[test]
    fn test_unit_fields() {
        let units = parse_catalog(CATALOG).unwrap();
        let squad = &units[0];

        assert_eq!(squad.content_id, content_id("sm-cat", "intercessors"));
        assert_eq!(squad.faction, "Imperium - Space Marines");
        assert_eq!(squad.points, 90);
        assert_eq!(squad.keywords, vec!["Infantry", "Battleline"]);
        assert_eq!(squad.abilities, vec!["Oath of Moment"]);

        // nested model weapons belong to the unit, duplicates collapse
        assert_eq!(squad.weapons.len(), 1);
        let rifle = &squad.weapons[0];
        assert_eq!(rifle.range, "24\"");
        assert_eq!(rifle.attacks, "2");
        assert_eq!(rifle.abilities, vec![WeaponAbility::Assault, WeaponAbility::Heavy]);
    }

    #[test]
    fn test_missing_optional_fields_get_defaults() {
        let units = parse_catalog(CATALOG).unwrap();
        let captain = &units[1];

        assert_eq!(captain.points, 80);
        assert!(captain.abilities.is_empty());
        assert!(captain.keywords.is_empty());
        let weapon = &captain.weapons[0];
        assert_eq!(weapon.range, "Melee");
        assert_eq!(weapon.attacks, "1");
        assert_eq!(weapon.skill, "2+");
        assert!(weapon.abilities.is_empty());

        let scouts = &units[2];
        assert_eq!(scouts.points, 0);
        assert!(scouts.weapons.is_empty());
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let first = parse_catalog(CATALOG).unwrap();
        let second = parse_catalog(CATALOG).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_catalogue() {
        let units = parse_catalog(r#"<catalogue id="empty" name="Nothing"></catalogue>"#).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn test_unnamed_weapon_profile_is_skipped_alone() {
        let xml = r#"<catalogue id="c" name="F">
  <selectionEntry type="unit" id="u" name="U">
    <profiles>
      <profile typeName="Ranged Weapons">
        <characteristics><characteristic name="A">3</characteristic></characteristics>
      </profile>
      <profile name="Gun" typeName="Ranged Weapons"/>
    </profiles>
  </selectionEntry>
</catalogue>"#;

        let units = parse_catalog(xml).unwrap();

        assert_eq!(units.len(), 1);
        let weapons: Vec<&str> = units[0].weapons.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(weapons, vec!["Gun"]);
    }

    #[test]
    fn test_unterminated_trailing_unit_is_skipped() {
        let xml = r#"<catalogue id="c" name="F">
  <selectionEntry type="unit" id="u" name="U">
    <profiles><profile name="Gun" typeName="Ranged Weapons"/></profiles>
  </selectionEntry>
  <selectionEntry type="unit" id="v" name="V">
    <profiles>"#;

        let units = parse_catalog(xml).unwrap();
        let summary: Vec<(&str, Vec<&str>)> = units
            .iter()
            .map(|u| (u.name.as_str(), u.weapons.iter().map(|w| w.name.as_str()).collect()))
            .collect();

        assert_eq!(summary, vec![("U", vec!["Gun"])]);
    }

    #[test]
    fn test_rejects_non_catalog_documents() {
        assert!(parse_catalog("<html><body/></html>").is_err());
        assert!(parse_catalog(r#"<catalogue name="No id"/>"#).is_err());
        assert!(parse_catalog("").is_err());
        assert!(parse_catalog(r#"<catalogue id="x"><selectionEntry></catalogue>"#).is_err());
    }
}
