//! Command-line interface. Parsing and printing live here; every command
//! body is a thin call into the service layer.

use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};

use crate::alerts::{self, ALERT_FORMAT};
use crate::changelog::MissionUpdate;
use crate::config::Config;
use crate::db::{CrmDb, DbUser};
use crate::error::CrmError;
use crate::export;
use crate::notify::LogMailer;
use crate::services::{companies, contacts, missions};
use crate::types::{ContactStatus, CsvEditor, EntityKind, MissionStatus};
use crate::util::format_amount;

#[derive(Parser)]
#[command(name = "pipecrm")]
#[command(version)]
#[command(
    about = "Track companies, contacts and sales missions from the terminal",
    long_about = None
)]
struct Cli {
    /// Act as this user id (overrides the config file)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },
    /// Manage contacts
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Manage missions
    Mission {
        #[command(subcommand)]
        command: MissionCommands,
    },
    /// List and cancel scheduled alerts
    Alerts {
        #[command(subcommand)]
        command: AlertCommands,
    },
    /// Export the mission pipeline as CSV
    Export {
        /// Target application: "oo" (UTF-8, comma) or "excel" (Windows-1252, semicolon)
        #[arg(long, default_value = "excel", value_parser = parse_editor)]
        editor: CsvEditor,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the user directory
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Create a company
    Add {
        title: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        zipcode: Option<String>,
        #[arg(long)]
        town: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        activity: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comment to append to the company log
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Edit a company
    Edit {
        code: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        zipcode: Option<String>,
        #[arg(long)]
        town: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        activity: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// List all companies
    List,
    /// Show one company with its comment log
    Show { code: String },
}

#[derive(Subcommand)]
enum ContactCommands {
    /// Create a contact
    Add {
        lastname: String,
        #[arg(long)]
        firstname: Option<String>,
        /// Company code this contact belongs to
        #[arg(long)]
        company: Option<String>,
        /// lead, client or dead
        #[arg(long, default_value = "lead", value_parser = parse_contact_status)]
        status: ContactStatus,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Edit a contact
    Edit {
        code: String,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long, value_parser = parse_contact_status)]
        status: Option<ContactStatus>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// List contacts, optionally filtered by status
    List {
        #[arg(long, value_parser = parse_contact_status)]
        status: Option<ContactStatus>,
    },
    /// Show one contact with its pipeline rollup and missions
    Show { code: String },
}

#[derive(Subcommand)]
enum MissionCommands {
    /// Create a mission linked to one or more contacts
    Add {
        title: String,
        /// Contact code (repeatable; at least one required)
        #[arg(long = "contact", required = true)]
        contacts: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        /// Chance of winning, 0-100
        #[arg(long)]
        probability: Option<i64>,
        /// YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        deadline: Option<NaiveDate>,
        /// opportunity, project, finished or nogo
        #[arg(long, default_value = "opportunity", value_parser = parse_mission_status)]
        status: MissionStatus,
        /// User id responsible for the mission
        #[arg(long)]
        assignee: Option<String>,
        /// User id to keep informed (repeatable)
        #[arg(long = "cc")]
        cc: Vec<String>,
        #[arg(short, long)]
        comment: Option<String>,
        #[arg(long)]
        attachment: Option<String>,
        /// Alert datetime, YYYY-MM-DDTHH:MM:SS
        #[arg(long, value_parser = parse_alert)]
        alert: Option<NaiveDateTime>,
        #[arg(long)]
        next_action: Option<String>,
    },
    /// Edit a mission; omitted fields keep their value
    Edit {
        code: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        probability: Option<i64>,
        #[arg(long, value_parser = parse_date)]
        deadline: Option<NaiveDate>,
        #[arg(long, value_parser = parse_mission_status)]
        status: Option<MissionStatus>,
        #[arg(long)]
        assignee: Option<String>,
        /// Replace the whole CC list (repeatable)
        #[arg(long = "cc")]
        cc: Option<Vec<String>>,
        #[arg(short, long)]
        comment: Option<String>,
        #[arg(long)]
        attachment: Option<String>,
        #[arg(long, value_parser = parse_alert)]
        alert: Option<NaiveDateTime>,
        #[arg(long)]
        next_action: Option<String>,
    },
    /// List missions, optionally filtered by status
    List {
        #[arg(long, value_parser = parse_mission_status)]
        status: Option<MissionStatus>,
    },
    /// Show one mission with its comment log
    Show { code: String },
    /// Link another contact to a mission
    Link { code: String, contact: String },
    /// Unlink a contact from a mission (the last one cannot go)
    Unlink { code: String, contact: String },
}

#[derive(Subcommand)]
enum AlertCommands {
    /// List pending alerts: today first, then upcoming, overdue last
    List,
    /// Cancel an alert by its comment id (the comment stays)
    Cancel { comment_id: i64 },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add or update a user directory entry
    Add {
        id: String,
        name: String,
        email: String,
    },
    /// List all users
    List,
}

fn parse_mission_status(s: &str) -> Result<MissionStatus, String> {
    MissionStatus::from_code(s).ok_or_else(|| {
        format!("unknown mission status \"{s}\" (opportunity, project, finished, nogo)")
    })
}

fn parse_contact_status(s: &str) -> Result<ContactStatus, String> {
    ContactStatus::from_code(s)
        .ok_or_else(|| format!("unknown contact status \"{s}\" (lead, client, dead)"))
}

fn parse_editor(s: &str) -> Result<CsvEditor, String> {
    CsvEditor::from_code(s).ok_or_else(|| format!("unknown editor \"{s}\" (oo, excel)"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_alert(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, ALERT_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SS: {e}"))
}

/// Entry point for the CLI.
pub fn run() -> Result<(), CrmError> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let db = config.open_db()?;
    let user = cli
        .user
        .as_deref()
        .unwrap_or_else(|| config.user_id())
        .to_string();

    match cli.command {
        Commands::Company { command } => run_company(&db, &user, command),
        Commands::Contact { command } => run_contact(&db, &user, command),
        Commands::Mission { command } => run_mission(&db, &user, command),
        Commands::Alerts { command } => run_alerts(&db, command),
        Commands::Export { editor, output } => run_export(&db, editor, output),
        Commands::User { command } => run_user(&db, command),
    }
}

fn print_comments(db: &CrmDb, kind: EntityKind, code: &str) -> Result<(), CrmError> {
    for comment in db.comments_for(kind, code)? {
        println!("[{}] {}: {}", comment.created_at, comment.author, comment.body);
        if let Some(attachment) = comment.attachment.as_deref() {
            println!("    attachment: {attachment}");
        }
        if let Some(alert_at) = comment.alert_at.as_deref() {
            println!("    alert: {alert_at}");
        }
        if let Some(next_action) = comment.next_action.as_deref() {
            println!("    next action: {next_action}");
        }
    }
    Ok(())
}

fn run_company(db: &CrmDb, user: &str, command: CompanyCommands) -> Result<(), CrmError> {
    match command {
        CompanyCommands::Add {
            title,
            address,
            zipcode,
            town,
            country,
            phone,
            website,
            activity,
            description,
            comment,
        } => {
            let form = companies::CompanyForm {
                title,
                address_1: address,
                zipcode,
                town,
                country,
                phone,
                website,
                activity,
                description,
                ..Default::default()
            };
            let code = companies::create_company(db, user, form, comment.as_deref())?;
            println!("{code}");
            Ok(())
        }
        CompanyCommands::Edit {
            code,
            title,
            address,
            zipcode,
            town,
            country,
            phone,
            website,
            activity,
            description,
            comment,
        } => {
            let old = companies::get_company(db, &code)?;
            let form = companies::CompanyForm {
                title: title.unwrap_or(old.title),
                address_1: address.or(old.address_1),
                address_2: old.address_2,
                zipcode: zipcode.or(old.zipcode),
                town: town.or(old.town),
                country: country.or(old.country),
                phone: phone.or(old.phone),
                fax: old.fax,
                website: website.or(old.website),
                activity: activity.or(old.activity),
                description: description.or(old.description),
                logo: old.logo,
            };
            companies::update_company(db, user, &code, form, comment.as_deref())
        }
        CompanyCommands::List => {
            for company in db.list_companies()? {
                println!("{}  {}", company.code, company.title);
            }
            Ok(())
        }
        CompanyCommands::Show { code } => {
            let company = companies::get_company(db, &code)?;
            println!("{}  {}", company.code, company.title);
            if let Some(town) = company.town.as_deref() {
                println!("town: {town}");
            }
            if let Some(activity) = company.activity.as_deref() {
                println!("activity: {activity}");
            }
            for contact in db.contacts_for_company(&code)? {
                println!("contact: {}  {}", contact.code, contact.display_name());
            }
            print_comments(db, EntityKind::Company, &code)
        }
    }
}

fn run_contact(db: &CrmDb, user: &str, command: ContactCommands) -> Result<(), CrmError> {
    match command {
        ContactCommands::Add {
            lastname,
            firstname,
            company,
            status,
            phone,
            mobile,
            email,
            position,
            description,
            comment,
        } => {
            let form = contacts::ContactForm {
                company,
                lastname,
                firstname,
                phone,
                mobile,
                email,
                position,
                description,
                status,
            };
            let code = contacts::create_contact(db, user, form, comment.as_deref())?;
            println!("{code}");
            Ok(())
        }
        ContactCommands::Edit {
            code,
            lastname,
            firstname,
            company,
            status,
            phone,
            mobile,
            email,
            position,
            description,
            comment,
        } => {
            let old = db.get_contact(&code)?.ok_or_else(|| CrmError::NotFound {
                kind: "contact",
                code: code.clone(),
            })?;
            let form = contacts::ContactForm {
                company: company.or(old.company),
                lastname: lastname.unwrap_or(old.lastname),
                firstname: firstname.or(old.firstname),
                phone: phone.or(old.phone),
                mobile: mobile.or(old.mobile),
                email: email.or(old.email),
                position: position.or(old.position),
                description: description.or(old.description),
                status: status.unwrap_or(old.status),
            };
            contacts::update_contact(db, user, &code, form, comment.as_deref())
        }
        ContactCommands::List { status } => {
            for contact in db.list_contacts(status)? {
                println!(
                    "{}  {}  [{}]",
                    contact.code,
                    contact.display_name(),
                    contact.status.label()
                );
            }
            Ok(())
        }
        ContactCommands::Show { code } => {
            let detail = contacts::contact_detail(db, &code)?;
            println!(
                "{}  {}",
                detail.contact.code,
                contacts::contact_title(db, &detail.contact)?
            );
            println!("status: {}", detail.contact.status.label());
            println!(
                "pipeline: assured {}  probable {}  ({} opportunities, {} won, {} finished, {} nogo)",
                format_amount(detail.rollup.assured),
                format_amount(detail.rollup.probable),
                detail.rollup.opportunity,
                detail.rollup.project,
                detail.rollup.finished,
                detail.rollup.nogo,
            );
            for mission in &detail.missions {
                println!(
                    "mission: {}  {}  [{}]",
                    mission.code,
                    mission.title,
                    mission.status.short_label()
                );
            }
            print_comments(db, EntityKind::Contact, &code)
        }
    }
}

fn run_mission(db: &CrmDb, user: &str, command: MissionCommands) -> Result<(), CrmError> {
    let mailer = LogMailer;
    match command {
        MissionCommands::Add {
            title,
            contacts,
            description,
            amount,
            probability,
            deadline,
            status,
            assignee,
            cc,
            comment,
            attachment,
            alert,
            next_action,
        } => {
            let update = MissionUpdate {
                title,
                description,
                amount,
                probability,
                deadline,
                status,
                assignee,
                cc,
                comment,
                attachment,
                alert_at: alert,
                next_action,
            };
            let code = missions::create_mission(db, &mailer, user, update, contacts)?;
            println!("{code}");
            Ok(())
        }
        MissionCommands::Edit {
            code,
            title,
            description,
            amount,
            probability,
            deadline,
            status,
            assignee,
            cc,
            comment,
            attachment,
            alert,
            next_action,
        } => {
            let old = missions::get_mission(db, &code)?;
            let mut update = MissionUpdate::unchanged(&old);
            if let Some(title) = title {
                update.title = title;
            }
            if description.is_some() {
                update.description = description;
            }
            if amount.is_some() {
                update.amount = amount;
            }
            if probability.is_some() {
                update.probability = probability;
            }
            if deadline.is_some() {
                update.deadline = deadline;
            }
            if let Some(status) = status {
                update.status = status;
            }
            if assignee.is_some() {
                update.assignee = assignee;
            }
            if let Some(cc) = cc {
                update.cc = cc;
            }
            update.comment = comment;
            update.attachment = attachment;
            update.alert_at = alert;
            update.next_action = next_action;

            for change in missions::edit_mission(db, &mailer, user, &code, update)? {
                println!("{change}");
            }
            Ok(())
        }
        MissionCommands::List { status } => {
            for mission in db.list_missions(status)? {
                println!(
                    "{}  {}  [{}]  {}",
                    mission.code,
                    mission.title,
                    mission.status.short_label(),
                    mission.amount.map(format_amount).unwrap_or_default(),
                );
            }
            Ok(())
        }
        MissionCommands::Show { code } => {
            let mission = missions::get_mission(db, &code)?;
            println!("{}  {}", mission.code, mission.title);
            println!("status: {}", mission.status.label());
            if let Some(amount) = mission.amount {
                println!("amount: {}", format_amount(amount));
            }
            if let Some(probability) = mission.probability {
                println!("probability: {probability}%");
            }
            if let Some(deadline) = mission.deadline.as_deref() {
                println!("deadline: {deadline}");
            }
            if let Some(assignee) = mission.assignee.as_deref() {
                println!("assignee: {assignee}");
            }
            if !mission.cc.is_empty() {
                println!("cc: {}", mission.cc.join(", "));
            }
            println!("contacts: {}", mission.contacts.join(", "));
            print_comments(db, EntityKind::Mission, &code)
        }
        MissionCommands::Link { code, contact } => {
            missions::add_mission_contact(db, &code, &contact)
        }
        MissionCommands::Unlink { code, contact } => {
            missions::remove_mission_contact(db, &code, &contact)
        }
    }
}

fn run_alerts(db: &CrmDb, command: AlertCommands) -> Result<(), CrmError> {
    match command {
        AlertCommands::List => {
            let now = Local::now().naive_local();
            for alert in alerts::list_alerts(db, now)? {
                println!(
                    "#{}  {}  [{:?}]  {}  {}",
                    alert.comment_id,
                    alert.alert_at.format(ALERT_FORMAT),
                    alert.urgency,
                    alert.mission_code,
                    alert.mission_title,
                );
                if let Some(next_action) = alert.next_action.as_deref() {
                    println!("    next action: {next_action}");
                }
            }
            Ok(())
        }
        AlertCommands::Cancel { comment_id } => alerts::cancel_alert(db, comment_id),
    }
}

fn run_export(
    db: &CrmDb,
    editor: CsvEditor,
    output: Option<PathBuf>,
) -> Result<(), CrmError> {
    let bytes = export::export_missions(db, editor)?;
    match output {
        Some(path) => std::fs::write(path, bytes)?,
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn run_user(db: &CrmDb, command: UserCommands) -> Result<(), CrmError> {
    match command {
        UserCommands::Add { id, name, email } => {
            db.upsert_user(&DbUser { id, name, email })?;
            Ok(())
        }
        UserCommands::List => {
            for user in db.list_users()? {
                println!("{}  {}  <{}>", user.id, user.name, user.email);
            }
            Ok(())
        }
    }
}
