//! Application state and command handlers.
//!
//! `App` builds the session store once at startup and hands it to every
//! command. Commands pass through the route gate first, so private commands
//! require a session and sign-in/sign-up are skipped when one exists.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate, Utc};
use gobarber_core::config::StorageBackend;
use gobarber_core::dashboard::{self, DaySchedule, MonthCalendar, ScheduledAppointment};
use gobarber_core::models::SignUpRequest;
use gobarber_core::profile::{self, ProfileError};
use gobarber_core::routes::Route;
use gobarber_core::utils::truncate_string;
use gobarber_core::validation::{
    ForgotPasswordForm, ProfileForm, SignInForm, Validate, ValidationErrors,
};
use gobarber_core::{ApiClient, Config, FileStore, KeyValueStore, KeyringStore, SessionStore};
use tracing::{debug, error, warn};

use crate::prompt;

/// Longest client name shown in schedule listings
const MAX_NAME_WIDTH: usize = 30;

type Store = SessionStore<Box<dyn KeyValueStore>>;

pub struct App {
    config: Config,
    session: Store,
}

impl App {
    /// Open the configured storage and restore any saved session
    pub fn new(config: Config) -> Result<Self> {
        let storage: Box<dyn KeyValueStore> = match config.storage {
            StorageBackend::File => {
                let dir = config.data_dir()?;
                debug!(?dir, "Using file storage");
                Box::new(
                    FileStore::open(&dir)
                        .with_context(|| format!("Failed to open storage in {}", dir.display()))?,
                )
            }
            StorageBackend::Keyring => Box::new(KeyringStore::new()),
        };

        let api = ApiClient::new(config.api_base_url()).context("Failed to create HTTP client")?;
        let session = SessionStore::initialize(storage, api);

        Ok(Self { config, session })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Apply the route gate. `Ok(false)` means the command has nothing to do.
    fn enter(&self, route: Route) -> Result<bool> {
        let target = route.resolve(self.is_authenticated());
        if target == route {
            return Ok(true);
        }
        match target {
            Route::SignIn => bail!("Not signed in. Run `gobarber signin` first."),
            _ => {
                if let Some(identity) = self.session.identity() {
                    println!(
                        "Already signed in as {} <{}>. Run `gobarber signout` to switch accounts.",
                        identity.name, identity.email
                    );
                }
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn sign_in(&mut self, email: Option<String>) -> Result<()> {
        if !self.enter(Route::SignIn)? {
            return Ok(());
        }

        let form = SignInForm {
            email: prompt::value_or_line(email, "Email", self.config.last_email.as_deref())?,
            password: prompt::password("Password")?,
        };
        check_form(&form)?;

        match self.session.sign_in(form.email.trim(), &form.password).await {
            Ok(identity) => println!("Welcome, {}!", identity.first_name()),
            Err(e) => {
                error!(error = %e, "Sign-in failed");
                let message = format!("Authentication error: {}", e.user_message());
                return Err(anyhow::Error::new(e).context(message));
            }
        }

        self.remember_email(form.email.trim());
        Ok(())
    }

    /// Persist the last email without writing command-line or env overrides
    fn remember_email(&mut self, email: &str) {
        self.config.last_email = Some(email.to_string());
        let mut stored = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, not saving last email");
                return;
            }
        };
        stored.last_email = Some(email.to_string());
        if let Err(e) = stored.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    pub fn sign_out(&mut self) -> Result<()> {
        let was_signed_in = self.is_authenticated();
        self.session.sign_out();
        if was_signed_in {
            println!("Signed out.");
        } else {
            println!("Not signed in.");
        }
        Ok(())
    }

    pub fn whoami(&self) -> Result<()> {
        match self.session.identity() {
            Some(identity) => {
                println!("{} <{}>", identity.name, identity.email);
                println!("  id:     {}", identity.id);
                if identity.has_avatar() {
                    println!("  avatar: {}", identity.avatar_url);
                } else {
                    println!("  avatar: (none)");
                }
            }
            None => println!("Not signed in."),
        }
        Ok(())
    }

    pub async fn sign_up(&mut self, name: Option<String>, email: Option<String>) -> Result<()> {
        if !self.enter(Route::SignUp)? {
            return Ok(());
        }

        let request = SignUpRequest {
            name: prompt::value_or_line(name, "Name", None)?.trim().to_string(),
            email: prompt::value_or_line(email, "Email", None)?.trim().to_string(),
            password: prompt::password("Password")?,
        };
        check_form(&request)?;

        if let Err(e) = self.session.api().create_user(&request).await {
            error!(error = %e, "Sign-up failed");
            let message = format!("Sign-up error: {}", e.user_message());
            return Err(anyhow::Error::new(e).context(message));
        }

        println!("Account created! You can now sign in with `gobarber signin`.");
        Ok(())
    }

    pub async fn forgot_password(&mut self, email: Option<String>) -> Result<()> {
        if !self.enter(Route::ForgotPassword)? {
            return Ok(());
        }

        let form = ForgotPasswordForm {
            email: prompt::value_or_line(email, "Email", self.config.last_email.as_deref())?
                .trim()
                .to_string(),
        };
        check_form(&form)?;

        if let Err(e) = self.session.api().forgot_password(&form.email).await {
            error!(error = %e, "Password recovery failed");
            let message = format!("Password recovery error: {}", e.user_message());
            return Err(anyhow::Error::new(e).context(message));
        }

        println!("Recovery email sent to {}. Check your inbox.", form.email);
        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn edit_profile(
        &mut self,
        name: Option<String>,
        email: Option<String>,
        change_password: bool,
    ) -> Result<()> {
        if !self.enter(Route::Profile)? {
            return Ok(());
        }

        let mut form = ProfileForm::from_identity(self.session.require_identity()?);
        form.name = prompt::value_or_line(name, "Name", Some(&form.name))?;
        form.email = prompt::value_or_line(email, "Email", Some(&form.email))?;
        if change_password {
            form.old_password = prompt::password("Current password")?;
            form.password = prompt::password("New password")?;
            form.password_confirmation = prompt::password("Confirm new password")?;
        }

        match profile::update_profile(&mut self.session, &form).await {
            Ok(identity) => {
                println!("Profile updated! {} <{}>", identity.name, identity.email);
                Ok(())
            }
            Err(ProfileError::Validation(errors)) => {
                print_validation_errors(&errors);
                bail!("Profile form is invalid")
            }
            Err(e) => Err(update_failed(e)),
        }
    }

    pub async fn change_avatar(&mut self, file: &Path) -> Result<()> {
        if !self.enter(Route::Profile)? {
            return Ok(());
        }

        match profile::update_avatar(&mut self.session, file).await {
            Ok(identity) => {
                println!("Avatar updated: {}", identity.avatar_url);
                Ok(())
            }
            Err(e) => Err(update_failed(e)),
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn schedule(&mut self, date: Option<NaiveDate>) -> Result<()> {
        if !self.enter(Route::Dashboard)? {
            return Ok(());
        }

        let provider = self.session.require_identity()?.clone();
        let date = date.unwrap_or_else(|| Local::now().date_naive());

        let data = dashboard::load_day(self.session.api(), &provider, date)
            .await
            .context("Failed to load schedule")?;

        let calendar = MonthCalendar::new(date.year(), date.month(), &data.availability);
        let schedule = DaySchedule::new(date, data.appointments, &Local, Utc::now());

        println!("Welcome, {}", provider.first_name());
        print!("{}", render_schedule(&schedule));
        if !calendar.is_selectable(date.day()) {
            println!("\n(This day is not open for bookings.)");
        }
        Ok(())
    }

    pub async fn calendar(&mut self, month: Option<NaiveDate>) -> Result<()> {
        if !self.enter(Route::Dashboard)? {
            return Ok(());
        }

        let provider = self.session.require_identity()?.clone();
        let month = month.unwrap_or_else(|| Local::now().date_naive());

        let availability = self
            .session
            .api()
            .fetch_month_availability(&provider.id, month.year(), month.month())
            .await
            .context("Failed to load month availability")?;

        let calendar = MonthCalendar::new(month.year(), month.month(), &availability);
        print!("{}", render_calendar(&calendar));
        Ok(())
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

fn check_form(form: &impl Validate) -> Result<()> {
    if let Err(errors) = form.validate() {
        print_validation_errors(&errors);
        bail!("Form is invalid");
    }
    Ok(())
}

fn print_validation_errors(errors: &ValidationErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {}: {}", field, message);
    }
}

fn update_failed(e: ProfileError) -> anyhow::Error {
    error!(error = %e, "Profile update failed");
    let message = match &e {
        ProfileError::Session(session) => format!("Update error: {}", session.user_message()),
        other => format!("Update error: {}", other),
    };
    anyhow::Error::new(e).context(message)
}

fn render_appointment(out: &mut String, item: &ScheduledAppointment) {
    let _ = writeln!(
        out,
        "  {}  {}",
        item.hour,
        truncate_string(&item.appointment.user.name, MAX_NAME_WIDTH)
    );
}

fn render_section<'a>(
    out: &mut String,
    title: &str,
    items: impl Iterator<Item = &'a ScheduledAppointment>,
) {
    let _ = writeln!(out, "\n{}", title);
    let mut any = false;
    for item in items {
        render_appointment(out, item);
        any = true;
    }
    if !any {
        let _ = writeln!(out, "  No appointments in this period");
    }
}

pub fn render_schedule(schedule: &DaySchedule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scheduled appointments");

    let mut heading = Vec::new();
    if schedule.is_today {
        heading.push("Today".to_string());
    }
    heading.push(schedule.date_text());
    heading.push(schedule.weekday_text());
    let _ = writeln!(out, "{}", heading.join(" | "));

    if let Some(next) = schedule.next() {
        let _ = writeln!(out, "\nUp next");
        render_appointment(&mut out, next);
    }

    render_section(&mut out, "Morning", schedule.morning());
    render_section(&mut out, "Afternoon", schedule.afternoon());
    out
}

/// Month grid, Monday first; non-bookable days shown as `·`
pub fn render_calendar(calendar: &MonthCalendar) -> String {
    let mut out = String::new();
    let Some(first) = calendar.first_day() else {
        return out;
    };

    let _ = writeln!(out, "{}", first.format("%B %Y"));
    let _ = writeln!(out, "Mo Tu We Th Fr Sa Su");

    let mut line = "   ".repeat(first.weekday().num_days_from_monday() as usize);
    for day in 1..=calendar.days_in_month() {
        if calendar.is_selectable(day) {
            let _ = write!(line, "{:>2} ", day);
        } else {
            line.push_str(" · ");
        }
        let is_sunday = calendar
            .date(day)
            .map(|d| d.weekday().num_days_from_monday() == 6)
            .unwrap_or(false);
        if is_sunday {
            let _ = writeln!(out, "{}", line.trim_end());
            line.clear();
        }
    }
    if !line.trim().is_empty() {
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}
