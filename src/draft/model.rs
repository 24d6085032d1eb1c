use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::program::{FundingCondition, Program, Tier, Visibility};

/// One block of the rich program description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    BulletList { items: Vec<String> },
    Quote { text: String },
}

impl Block {
    fn render(&self) -> Option<String> {
        let rendered = match self {
            Block::Heading { level, text } => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                format!("{} {}", "#".repeat((*level).clamp(1, 6) as usize), text)
            }
            Block::Paragraph { text } => text.trim().to_string(),
            Block::BulletList { items } => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Quote { text } => text
                .trim()
                .lines()
                .map(|line| format!("> {}", line))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}

/// Rich description document, serialized to markdown for submission.
///
/// A document parsed from remote markdown keeps that markdown and renders it
/// back unchanged; any edit replaces the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl Description {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks, source: None }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(vec![Block::Paragraph { text: text.into() }])
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn to_markdown(&self) -> String {
        if let Some(source) = &self.source {
            return source.clone();
        }
        self.blocks
            .iter()
            .filter_map(Block::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// A document is empty when its serialized form has zero length
    pub fn is_empty(&self) -> bool {
        match &self.source {
            Some(source) => source.trim().is_empty(),
            None => self.to_markdown().is_empty(),
        }
    }

    pub fn from_markdown(markdown: &str) -> Self {
        let mut blocks = Vec::new();

        for chunk in markdown.split("\n\n").map(str::trim).filter(|c| !c.is_empty()) {
            let lines: Vec<&str> = chunk.lines().collect();

            if lines.len() == 1 && chunk.starts_with('#') {
                let level = chunk.chars().take_while(|c| *c == '#').count();
                blocks.push(Block::Heading {
                    level: level.min(6) as u8,
                    text: chunk[level..].trim().to_string(),
                });
            } else if lines.iter().all(|line| line.starts_with("- ")) {
                blocks.push(Block::BulletList {
                    items: lines.iter().map(|line| line[2..].to_string()).collect(),
                });
            } else if lines.iter().all(|line| line.starts_with('>')) {
                blocks.push(Block::Quote {
                    text: lines
                        .iter()
                        .map(|line| line.trim_start_matches('>').trim_start())
                        .collect::<Vec<_>>()
                        .join("\n"),
                });
            } else {
                blocks.push(Block::Paragraph {
                    text: chunk.to_string(),
                });
            }
        }

        Self {
            blocks,
            source: Some(markdown.to_string()),
        }
    }
}

/// Locally selected image file; never persisted with the draft
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierInput {
    pub enabled: bool,
    pub max_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierInputs {
    pub bronze: TierInput,
    pub silver: TierInput,
    pub gold: TierInput,
    pub platinum: TierInput,
}

impl TierInputs {
    pub fn get(&self, tier: Tier) -> &TierInput {
        match tier {
            Tier::Bronze => &self.bronze,
            Tier::Silver => &self.silver,
            Tier::Gold => &self.gold,
            Tier::Platinum => &self.platinum,
        }
    }

    pub fn get_mut(&mut self, tier: Tier) -> &mut TierInput {
        match tier {
            Tier::Bronze => &mut self.bronze,
            Tier::Silver => &mut self.silver,
            Tier::Gold => &mut self.gold,
            Tier::Platinum => &mut self.platinum,
        }
    }

    /// Enabled tiers in Bronze..Platinum order
    pub fn enabled(&self) -> impl Iterator<Item = (Tier, &TierInput)> + '_ {
        Tier::ALL
            .into_iter()
            .map(move |tier| (tier, self.get(tier)))
            .filter(|(_, input)| input.enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    #[default]
    Default,
    Custom,
}

/// Client-held program configuration edited by the wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgramDraft {
    pub name: String,
    /// Decimal string as typed
    pub price: String,
    pub description: Description,
    pub summary: String,
    pub currency: String,
    pub deadline: Option<DateTime<Utc>>,
    pub keywords: Vec<String>,
    pub validators: Vec<String>,
    pub validator_addresses: Vec<String>,
    pub links: Vec<String>,
    pub network: String,
    pub visibility: Visibility,
    pub invited_builders: Vec<String>,
    pub application_start_date: Option<DateTime<Utc>>,
    pub application_end_date: Option<DateTime<Utc>>,
    pub funding_start_date: Option<DateTime<Utc>>,
    pub funding_end_date: Option<DateTime<Utc>>,
    pub funding_condition: FundingCondition,
    pub tier_settings: TierInputs,
    pub fee_type: FeeType,
    pub custom_fee_percentage: Option<Decimal>,
    /// Image already uploaded for an existing program
    pub existing_image: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageFile>,
}

impl ProgramDraft {
    pub fn has_image(&self) -> bool {
        self.image.is_some() || self.existing_image.is_some()
    }

    /// Move the application start; the end date follows if it would fall behind
    pub fn set_application_start(&mut self, start: Option<DateTime<Utc>>) {
        self.application_start_date = start;
        advance_due_date(start, &mut self.application_end_date);
    }

    pub fn set_application_end(&mut self, end: Option<DateTime<Utc>>) {
        self.application_end_date = end;
    }

    /// Move the funding start; the end date follows if it would fall behind
    pub fn set_funding_start(&mut self, start: Option<DateTime<Utc>>) {
        self.funding_start_date = start;
        advance_due_date(start, &mut self.funding_end_date);
    }

    pub fn set_funding_end(&mut self, end: Option<DateTime<Utc>>) {
        self.funding_end_date = end;
    }

    /// Copy of this draft as it would be persisted (image file dropped)
    pub fn snapshot(&self) -> Self {
        Self {
            image: None,
            ..self.clone()
        }
    }
}

fn advance_due_date(start: Option<DateTime<Utc>>, due: &mut Option<DateTime<Utc>>) {
    if let (Some(start), Some(current_due)) = (start, *due) {
        if start > current_due {
            *due = Some(start);
        }
    }
}

impl From<&Program> for ProgramDraft {
    fn from(program: &Program) -> Self {
        let mut tier_settings = TierInputs::default();
        for (tier, setting) in &program.tier_settings {
            let input = tier_settings.get_mut(*tier);
            input.enabled = setting.enabled;
            input.max_amount = Some(setting.max_amount);
        }

        let (fee_type, custom_fee_percentage) = match program.custom_fee_percentage {
            Some(bps) => (FeeType::Custom, Some(Decimal::new(bps as i64, 2))),
            None => (FeeType::Default, None),
        };

        Self {
            name: program.name.clone(),
            price: program.price.to_string(),
            description: Description::from_markdown(&program.description),
            summary: program.summary.clone(),
            currency: program.currency.clone(),
            deadline: program.deadline,
            keywords: program.keywords.clone(),
            validators: program.validators.clone(),
            validator_addresses: program.validator_addresses.clone(),
            links: program.links.clone(),
            network: program.network.clone(),
            visibility: program.visibility,
            invited_builders: program.invited_builders.clone(),
            application_start_date: program.application_start_date,
            application_end_date: program.application_end_date,
            funding_start_date: program.funding_start_date,
            funding_end_date: program.funding_end_date,
            funding_condition: program.funding_condition,
            tier_settings,
            fee_type,
            custom_fee_percentage,
            existing_image: program.image.clone(),
            image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_start_after_due_moves_due() {
        let mut draft = ProgramDraft::default();
        draft.set_application_end(Some(day(5)));
        draft.set_application_start(Some(day(9)));
        assert_eq!(draft.application_end_date, Some(day(9)));

        draft.set_funding_end(Some(day(1)));
        draft.set_funding_start(Some(day(3)));
        assert_eq!(draft.funding_end_date, Some(day(3)));
    }

    #[test]
    fn test_start_before_due_keeps_due() {
        let mut draft = ProgramDraft::default();
        draft.set_funding_end(Some(day(20)));
        draft.set_funding_start(Some(day(10)));
        assert_eq!(draft.funding_end_date, Some(day(20)));
    }

    #[test]
    fn test_unset_due_date_stays_unset() {
        let mut draft = ProgramDraft::default();
        draft.set_application_start(Some(day(10)));
        assert_eq!(draft.application_end_date, None);
    }

    #[test]
    fn test_blank_description_is_empty() {
        let description = Description::new(vec![
            Block::Paragraph { text: "   ".into() },
            Block::BulletList { items: vec!["".into()] },
            Block::Heading { level: 2, text: "".into() },
        ]);
        assert!(description.is_empty());
        assert!(Description::default().is_empty());
        assert!(!Description::paragraph("Funding for tooling").is_empty());
    }

    #[test]
    fn test_markdown_rendering_and_parsing() {
        let description = Description::new(vec![
            Block::Heading { level: 2, text: "Scope".into() },
            Block::Paragraph { text: "We fund compilers.".into() },
            Block::BulletList { items: vec!["parsers".into(), "codegen".into()] },
            Block::Quote { text: "Ship it".into() },
        ]);

        let markdown = description.to_markdown();
        assert_eq!(
            markdown,
            "## Scope\n\nWe fund compilers.\n\n- parsers\n- codegen\n\n> Ship it"
        );
        assert_eq!(Description::from_markdown(&markdown).blocks(), description.blocks());
    }

    #[test]
    fn test_parsed_markdown_renders_back_unchanged() {
        let remote = "#rust grants for   everyone\n\n  - loose item";
        let description = Description::from_markdown(remote);
        assert_eq!(description.to_markdown(), remote);
        assert!(!description.is_empty());
        assert!(Description::from_markdown("  \n ").is_empty());

        let restored: Description =
            serde_json::from_str(&serde_json::to_string(&description).unwrap()).unwrap();
        assert_eq!(restored.to_markdown(), remote);
    }

    #[test]
    fn test_snapshot_drops_image_only() {
        let mut draft = ProgramDraft {
            name: "Grants".into(),
            existing_image: Some("https://cdn/img.png".into()),
            ..Default::default()
        };
        draft.image = Some(ImageFile {
            file_name: "logo.png".into(),
            bytes: vec![1, 2, 3],
        });

        let snapshot = draft.snapshot();
        assert!(snapshot.image.is_none());
        assert_eq!(snapshot.existing_image, draft.existing_image);
        assert_eq!(snapshot.name, "Grants");
    }

    #[test]
    fn test_enabled_tiers_in_order() {
        let mut tiers = TierInputs::default();
        tiers.platinum.enabled = true;
        tiers.bronze.enabled = true;
        let enabled: Vec<Tier> = tiers.enabled().map(|(tier, _)| tier).collect();
        assert_eq!(enabled, vec![Tier::Bronze, Tier::Platinum]);
    }
}
