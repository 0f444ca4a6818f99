//! CLI wizard — line-oriented stdin/stdout driver for the onboarding flow.
//!
//! Renders each screen as a plain numbered list and turns typed commands
//! into drafts and intents. Generic over the reader and writer so tests can
//! script a whole session.

use std::sync::Arc;

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::onboarding::{
    AlcoholIntake, AllergyChoice, AllergyOrigin, DietChoice, HealthConcernsDraft, Item,
    LifestyleDraft, OnboardingIntent, OnboardingManager, WizardStep,
};

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Next,
    Back,
    /// 1-based list position (0 means "None" on the diets screen).
    Pick(usize),
    /// Move priority `from` to `to`, both 1-based.
    Move(usize, usize),
    Remove(usize),
    Add(&'a str),
    Text(&'a str),
}

pub fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    match line {
        "next" | "n" => return Command::Next,
        "back" | "b" => return Command::Back,
        _ => {}
    }
    if let Ok(n) = line.parse() {
        return Command::Pick(n);
    }
    if let Some(rest) = line.strip_prefix("mv ") {
        let mut parts = rest.split_whitespace().map(str::parse::<usize>);
        if let (Some(Ok(from)), Some(Ok(to)), None) = (parts.next(), parts.next(), parts.next()) {
            return Command::Move(from, to);
        }
    }
    if let Some(Ok(n)) = line.strip_prefix("rm ").map(|rest| rest.trim().parse()) {
        return Command::Remove(n);
    }
    if let Some(rest) = line.strip_prefix("add ") {
        return Command::Add(rest.trim());
    }
    Command::Text(line)
}

/// Terminal front end for an [`OnboardingManager`].
pub struct CliWizard {
    manager: Arc<OnboardingManager>,
}

impl CliWizard {
    pub fn new(manager: Arc<OnboardingManager>) -> Self {
        Self { manager }
    }

    /// Run against the process's stdin and stdout.
    pub async fn run_stdio(&self) -> io::Result<()> {
        self.run(BufReader::new(io::stdin()), io::stdout()).await
    }

    /// Run until the profile is saved or input ends.
    pub async fn run<R, W>(&self, input: R, mut out: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut screen = WizardStep::Welcome;
        loop {
            let next = match screen {
                WizardStep::Welcome => self.welcome(&mut lines, &mut out).await?,
                WizardStep::HealthConcerns => self.health_concerns(&mut lines, &mut out).await?,
                WizardStep::Diets => self.diets(&mut lines, &mut out).await?,
                WizardStep::Allergies => self.allergies(&mut lines, &mut out).await?,
                WizardStep::Lifestyle => self.lifestyle(&mut lines, &mut out).await?,
            };
            match next {
                Some(step) => screen = step,
                None => return Ok(()),
            }
        }
    }

    async fn welcome<R, W>(&self, lines: &mut Lines<R>, out: &mut W) -> io::Result<Option<WizardStep>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        say(out, "Welcome! A few questions and we'll build your health profile.").await?;
        say(out, "Press Enter to get started.").await?;
        if lines.next_line().await?.is_none() {
            return Ok(None);
        }
        self.dispatch(OnboardingIntent::GetStarted, out).await?;
        Ok(Some(WizardStep::HealthConcerns))
    }

    async fn health_concerns<R, W>(
        &self,
        lines: &mut Lines<R>,
        out: &mut W,
    ) -> io::Result<Option<WizardStep>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let session = self.manager.snapshot().await;
        let mut draft = session.health_concerns_draft();
        let catalog = self.manager.catalog().health_concerns();
        let max = session.max_health_concerns().unwrap_or(catalog.len());

        loop {
            say(out, &render_concerns(catalog, &draft, max)).await?;
            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            match parse_command(&line) {
                Command::Next => {
                    let intent = OnboardingIntent::CommitHealthConcerns(draft.clone());
                    if self.dispatch(intent, out).await? {
                        return Ok(Some(WizardStep::Diets));
                    }
                }
                Command::Back => {
                    self.dispatch(OnboardingIntent::Back, out).await?;
                    return Ok(Some(WizardStep::Welcome));
                }
                Command::Pick(n) => match pick(catalog, n) {
                    Some(concern) => {
                        if let Err(e) = draft.toggle(concern.clone()) {
                            say(out, &format!("! {e}")).await?;
                        }
                    }
                    None => say(out, "! No such option").await?,
                },
                Command::Move(from, to) => {
                    let moved = draft.move_concern(from.wrapping_sub(1), to.wrapping_sub(1));
                    if let Err(e) = moved {
                        say(out, &format!("! {e}")).await?;
                    }
                }
                _ => say(out, "Type a number to toggle, `mv A B` to reprioritize, `next` or `back`.").await?,
            }
        }
    }

    async fn diets<R, W>(&self, lines: &mut Lines<R>, out: &mut W) -> io::Result<Option<WizardStep>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut draft = self.manager.snapshot().await.diets_draft();
        let catalog = self.manager.catalog().diets();

        loop {
            let mut screen = String::from("Select the diets you follow.\n");
            screen.push_str(&format!(" 0. [{}] None\n", mark(draft.is_none_selected())));
            for (idx, diet) in catalog.iter().enumerate() {
                let selected = draft.selected().iter().any(|d| d.id == diet.id);
                screen.push_str(&format!("{:>2}. [{}] {}", idx + 1, mark(selected), diet.name));
                if let Some(tip) = &diet.tool_tip {
                    screen.push_str(&format!(" ({tip})"));
                }
                screen.push('\n');
            }
            say(out, screen.trim_end()).await?;

            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            match parse_command(&line) {
                Command::Next => {
                    self.dispatch(OnboardingIntent::CommitDiets(draft.clone()), out)
                        .await?;
                    return Ok(Some(WizardStep::Allergies));
                }
                Command::Back => {
                    self.dispatch(OnboardingIntent::Back, out).await?;
                    return Ok(Some(WizardStep::HealthConcerns));
                }
                Command::Pick(n) => {
                    let choice = match n {
                        0 => Some(DietChoice::None),
                        n => pick(catalog, n).cloned().map(DietChoice::Diet),
                    };
                    match choice {
                        Some(choice) => {
                            if let Err(e) = draft.toggle(choice) {
                                say(out, &format!("! {e}")).await?;
                            }
                        }
                        None => say(out, "! No such option").await?,
                    }
                }
                _ => say(out, "Type a number to toggle (0 for None), `next` or `back`.").await?,
            }
        }
    }

    async fn allergies<R, W>(&self, lines: &mut Lines<R>, out: &mut W) -> io::Result<Option<WizardStep>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut draft = self.manager.snapshot().await.allergies_draft();
        let catalog = self.manager.catalog().allergies();
        let mut suggestions: Vec<AllergyChoice> = Vec::new();

        say(out, "Any allergies or sensitivities? (optional)").await?;
        say(out, "Type to search, a number to pick a match, `add <name>`, `rm N`, `next` or `back`.").await?;
        loop {
            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            match parse_command(&line) {
                Command::Next => {
                    self.dispatch(OnboardingIntent::CommitAllergies(draft.clone()), out)
                        .await?;
                    return Ok(Some(WizardStep::Lifestyle));
                }
                Command::Back => {
                    self.dispatch(OnboardingIntent::Back, out).await?;
                    return Ok(Some(WizardStep::Diets));
                }
                Command::Pick(n) => match pick(&suggestions, n) {
                    Some(choice) => {
                        draft.select(choice.clone());
                        suggestions.clear();
                    }
                    None => say(out, "! No such suggestion").await?,
                },
                Command::Remove(n) => {
                    let target = pick(draft.selected(), n).map(|c| (c.origin, c.item.id.clone()));
                    match target {
                        Some((origin, id)) => {
                            draft.remove(origin, &id);
                        }
                        None => say(out, "! No such allergy").await?,
                    }
                }
                Command::Add(text) => {
                    if draft.add_custom(text, catalog).is_none() {
                        say(out, "! Already listed (pick it from the matches) or empty").await?;
                    }
                }
                Command::Text(text) => {
                    suggestions = draft.suggestions(text, catalog).collect();
                    if suggestions.is_empty() {
                        say(out, &format!("No matches. Use `add {}` to add it.", text.trim())).await?;
                    }
                    for (idx, choice) in suggestions.iter().enumerate() {
                        say(out, &format!("{:>2}. {}", idx + 1, choice.name())).await?;
                    }
                    continue;
                }
                Command::Move(..) => say(out, "! Nothing to reorder here").await?,
            }
            let selected: Vec<String> = draft
                .selected()
                .iter()
                .enumerate()
                .map(|(idx, c)| match c.origin {
                    AllergyOrigin::Catalog => format!("{}. {}", idx + 1, c.name()),
                    AllergyOrigin::Custom => format!("{}. {} (custom)", idx + 1, c.name()),
                })
                .collect();
            say(out, &format!("Selected: {}", selected.join(", "))).await?;
        }
    }

    async fn lifestyle<R, W>(&self, lines: &mut Lines<R>, out: &mut W) -> io::Result<Option<WizardStep>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut draft: LifestyleDraft = self.manager.snapshot().await.lifestyle_draft();

        let questions: [(&str, &str); 3] = [
            ("Is your daily exposure to sun limited? (y/n)", "yn"),
            ("Do you currently smoke (tobacco or marijuana)? (y/n)", "yn"),
            (
                "On average, how many alcoholic beverages do you have in a week? (1) 0-1 (2) 2-5 (3) 5+",
                "alcohol",
            ),
        ];

        for (idx, (question, kind)) in questions.iter().enumerate() {
            loop {
                say(out, question).await?;
                let Some(line) = lines.next_line().await? else {
                    return Ok(None);
                };
                if parse_command(&line) == Command::Back {
                    self.dispatch(OnboardingIntent::Back, out).await?;
                    return Ok(Some(WizardStep::Allergies));
                }
                let answered = match (*kind, line.trim()) {
                    ("yn", "y" | "yes") => set_yes_no(&mut draft, idx, true),
                    ("yn", "n" | "no") => set_yes_no(&mut draft, idx, false),
                    ("alcohol", raw) => match raw.parse::<usize>() {
                        Ok(n @ 1..=3) => {
                            draft.set_alcohol(AlcoholIntake::ALL[n - 1]);
                            true
                        }
                        _ => false,
                    },
                    _ => false,
                };
                if answered {
                    break;
                }
                say(out, "! Please pick one of the listed answers").await?;
            }
        }

        if !self.dispatch(OnboardingIntent::SubmitLifestyle(draft), out).await? {
            return Ok(Some(WizardStep::Lifestyle));
        }

        loop {
            let session = self.manager.snapshot().await;
            if session.is_completed() {
                say(out, "Your personalized profile is saved.").await?;
                if let Some(profile) = self.manager.load().await {
                    let pretty = serde_json::to_string_pretty(&profile)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    say(out, &pretty).await?;
                }
                return Ok(None);
            }
            let error = session.error().unwrap_or("unknown error");
            say(out, &format!("! Could not save your profile: {error}")).await?;
            say(out, "Press Enter to retry or type `back`.").await?;
            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            if parse_command(&line) == Command::Back {
                self.dispatch(OnboardingIntent::Back, out).await?;
                return Ok(Some(WizardStep::Allergies));
            }
            if let Err(e) = self.manager.save().await {
                say(out, &format!("! {e}")).await?;
            }
        }
    }

    /// Dispatch an intent and show any rejection. Returns whether it was accepted.
    async fn dispatch<W>(&self, intent: OnboardingIntent, out: &mut W) -> io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        match self.manager.dispatch(intent).await {
            Ok(()) => Ok(true),
            Err(e) => {
                say(out, &format!("! {e}")).await?;
                Ok(false)
            }
        }
    }
}

fn set_yes_no(draft: &mut LifestyleDraft, question: usize, value: bool) -> bool {
    match question {
        0 => draft.set_daily_exposure(value),
        _ => draft.set_smoke(value),
    }
    true
}

fn render_concerns(catalog: &[Item], draft: &HealthConcernsDraft, max: usize) -> String {
    let mut screen = format!("Select the top health concerns (up to {max}).\n");
    for (idx, concern) in catalog.iter().enumerate() {
        let selected = draft.is_selected(&concern.id);
        screen.push_str(&format!("{:>2}. [{}] {}\n", idx + 1, mark(selected), concern.name));
    }
    if !draft.prioritized().is_empty() {
        screen.push_str("Priority:\n");
        for (idx, concern) in draft.prioritized().iter().enumerate() {
            screen.push_str(&format!("  {}. {}\n", idx + 1, concern.name));
        }
    }
    screen.trim_end().to_string()
}

fn mark(selected: bool) -> char {
    if selected { 'x' } else { ' ' }
}

fn pick<T>(items: &[T], n: usize) -> Option<&T> {
    n.checked_sub(1).and_then(|idx| items.get(idx))
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
