use crate::{
    classify::Clock,
    config::Config,
    model::{Role, User},
    policy::Session,
    report::format_records,
    scanner::{self, ScanFeed},
    schedule::Schedule,
    store::Store,
    tracker::{Notice, Tracker},
};
use anyhow::Result;
use chrono::NaiveDate;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub struct Context<S: Store> {
    pub root: PathBuf,
    pub session_id: String,
    pub session: RefCell<Session>,
    pub config: Config,
    pub tracker: RefCell<Tracker<S>>,
    pub feed: RefCell<ScanFeed>,
    pub clock: Box<dyn Clock>,
}

pub fn run_once<S: Store>(ctx: &Context<S>, line: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    handle_line(ctx, line, &mut out)?;
    Ok(())
}

/// Treat every input line as one scanner detection
pub fn run_scan_stream<S: Store, R: BufRead>(
    ctx: &Context<S>,
    input: R,
    out: &mut dyn Write,
) -> Result<()> {
    for line in scanner::read_lines(input) {
        scan(ctx, &line?, out)?;
    }
    Ok(())
}

pub fn run_repl<S: Store>(ctx: Context<S>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = ctx.root.join(".rollcall").join("history");
    let _ = rl.load_history(&history);

    println!("rollcall - scan a badge or type /help, /exit to quit");

    loop {
        let prompt = format!("rollcall[{}]> ", ctx.session.borrow().role);
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                let mut out = io::stdout().lock();
                match handle_line(&ctx, line, &mut out) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(dir) = history.parent() {
        if std::fs::create_dir_all(dir).is_ok() {
            let _ = rl.save_history(&history);
        }
    }
    Ok(())
}

/// Run one input line. Returns true when the session should end.
pub fn handle_line<S: Store>(ctx: &Context<S>, line: &str, out: &mut dyn Write) -> Result<bool> {
    if line.trim_start().starts_with('/') {
        handle_command(ctx, line.trim(), out)
    } else {
        scan(ctx, line, out)?;
        Ok(false)
    }
}

fn scan<S: Store>(ctx: &Context<S>, raw: &str, out: &mut dyn Write) -> Result<()> {
    let now = ctx.clock.now();
    let Some(code) = ctx.feed.borrow_mut().detect(raw, now) else {
        return Ok(());
    };
    let session = *ctx.session.borrow();
    let result = ctx.tracker.borrow_mut().scan(&session, &code, now);
    writeln!(out, "{}", Notice::for_scan(&result).message())?;
    Ok(())
}

fn handle_command<S: Store>(ctx: &Context<S>, cmd: &str, out: &mut dyn Write) -> Result<bool> {
    let parts = match shell_words::split(cmd) {
        Ok(parts) => parts,
        Err(e) => {
            writeln!(out, "Could not parse command: {}", e)?;
            return Ok(false);
        }
    };
    let Some((name, rest)) = parts.split_first() else {
        return Ok(false);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    let session = *ctx.session.borrow();

    match name.as_str() {
        "/exit" | "/quit" => return Ok(true),
        "/help" => print_help(out)?,
        "/session" => {
            writeln!(out, "Session: {}", ctx.session_id)?;
            writeln!(out, "Role: {}", session.role)?;
            writeln!(out, "Data: {}", ctx.config.data_dir(&ctx.root).display())?;
            match ctx.tracker.borrow().journal_path() {
                Some(path) => writeln!(out, "Journal: {}", path.display())?,
                None => writeln!(out, "Journal: disabled")?,
            }
        }
        "/role" => match args.first() {
            Some(role) => match Role::from_str(role) {
                Some(role) => {
                    *ctx.session.borrow_mut() = Session::new(role);
                    writeln!(out, "Role: {}", role)?;
                }
                None => writeln!(out, "Unknown role. Valid: Admin, Employee")?,
            },
            None => writeln!(out, "Current role: {}", session.role)?,
        },
        "/scan" => match args.first() {
            Some(code) => scan(ctx, code, out)?,
            None => writeln!(out, "Usage: /scan <id>")?,
        },
        "/users" => {
            let mut tracker = ctx.tracker.borrow_mut();
            match tracker.list_users(&session) {
                Ok(users) => write!(out, "{}", format_users(users))?,
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
        "/add" => match parse_user(&args) {
            Some(user) => {
                let id = user.id.clone();
                match ctx.tracker.borrow_mut().add_user(&session, user) {
                    Ok(()) => writeln!(out, "Added user {}", id)?,
                    Err(e) => writeln!(out, "{}", e)?,
                }
            }
            None => writeln!(out, "Usage: /add <id> <name> <department> [Admin|Employee]")?,
        },
        "/edit" => match args.split_first() {
            Some((id, fields)) if (3..=4).contains(&fields.len()) => match parse_user(fields) {
                Some(user) => {
                    let new_id = user.id.clone();
                    match ctx.tracker.borrow_mut().edit_user(&session, id, user) {
                        Ok(()) if new_id == *id => writeln!(out, "Updated user {}", id)?,
                        Ok(()) => writeln!(
                            out,
                            "Updated user {} (now {}); earlier attendance stays under {}",
                            id, new_id, id
                        )?,
                        Err(e) => writeln!(out, "{}", e)?,
                    }
                }
                None => writeln!(out, "Unknown role. Valid: Admin, Employee")?,
            },
            _ => writeln!(
                out,
                "Usage: /edit <id> <new-id> <name> <department> [Admin|Employee]"
            )?,
        },
        "/rename" => match args.as_slice() {
            [old, new] => match ctx.tracker.borrow_mut().rename_user(&session, old, new) {
                Ok(()) => writeln!(out, "Renamed {} to {}", old, new)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            _ => writeln!(out, "Usage: /rename <old-id> <new-id>")?,
        },
        "/delete" => match args.first() {
            Some(id) => match ctx.tracker.borrow_mut().delete_user(&session, id) {
                Ok(true) => writeln!(out, "Deleted user {}", id)?,
                Ok(false) => writeln!(out, "No user {}", id)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            None => writeln!(out, "Usage: /delete <id>")?,
        },
        "/log" => {
            let mut tracker = ctx.tracker.borrow_mut();
            match tracker.log(&session) {
                Ok(records) => write!(out, "{}", format_records(records))?,
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
        "/report" => match parse_report_date(args.first().copied()) {
            Ok(date) => match ctx.tracker.borrow_mut().report(&session, date) {
                Ok(report) => write!(out, "{}", report.format_display())?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Err(msg) => writeln!(out, "{}", msg)?,
        },
        "/export" => match parse_report_date(args.first().copied()) {
            Ok(date) => {
                let dir = args
                    .get(1)
                    .map(|d| ctx.root.join(d))
                    .unwrap_or_else(|| ctx.root.clone());
                match ctx.tracker.borrow_mut().export_report(&session, date, &dir) {
                    Ok(path) => writeln!(out, "Report written to {}", path.display())?,
                    Err(e) => writeln!(out, "{}", e)?,
                }
            }
            Err(msg) => writeln!(out, "{}", msg)?,
        },
        "/config" => handle_config_command(ctx, &session, &args, out)?,
        _ => writeln!(out, "Unknown command: {}", name)?,
    }
    Ok(false)
}

fn handle_config_command<S: Store>(
    ctx: &Context<S>,
    session: &Session,
    args: &[&str],
    out: &mut dyn Write,
) -> Result<()> {
    let mut tracker = ctx.tracker.borrow_mut();
    match args {
        [] => match tracker.schedule(session) {
            Ok(schedule) => {
                writeln!(out, "Work start:     {}", schedule.work_start)?;
                writeln!(out, "Work end:       {}", schedule.work_end)?;
                writeln!(out, "Late tolerance: {} min", schedule.late_tolerance)?;
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        ["set", start, end, tolerance] => match tolerance.parse::<u32>() {
            Ok(tolerance) => {
                let schedule = Schedule::new(start, end, tolerance);
                match tracker.save_schedule(session, schedule) {
                    Ok(()) => writeln!(out, "Configuration saved.")?,
                    Err(e) => writeln!(out, "{}", e)?,
                }
            }
            Err(_) => writeln!(
                out,
                "Late tolerance must be a whole number of minutes, got '{}'",
                tolerance
            )?,
        },
        _ => {
            writeln!(out, "Usage:")?;
            writeln!(out, "  /config                              - show configuration")?;
            writeln!(out, "  /config set <start> <end> <minutes>  - save configuration")?;
        }
    }
    Ok(())
}

fn print_help(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Any line that does not start with / is scanned as a badge id.")?;
    writeln!(out, "Commands:")?;
    writeln!(out, "  /exit                 - quit")?;
    writeln!(out, "  /help                 - show commands")?;
    writeln!(out, "  /session              - show session info")?;
    writeln!(out, "  /role [name]          - get/set acting role (Admin|Employee)")?;
    writeln!(out, "  /scan <id>            - record a scan")?;
    writeln!(out, "Users (Admin):")?;
    writeln!(out, "  /users                - list users")?;
    writeln!(out, "  /add <id> <name> <department> [role]")?;
    writeln!(out, "  /edit <id> <new-id> <name> <department> [role]")?;
    writeln!(out, "  /rename <old-id> <new-id>")?;
    writeln!(out, "  /delete <id>")?;
    writeln!(out, "Reports:")?;
    writeln!(out, "  /log                  - full attendance log")?;
    writeln!(out, "  /report [YYYY-MM-DD]  - present and absent lists")?;
    writeln!(out, "  /export [YYYY-MM-DD|all] [dir] - write CSV report")?;
    writeln!(out, "Configuration:")?;
    writeln!(out, "  /config               - show work hours")?;
    writeln!(out, "  /config set <start> <end> <minutes> (Admin)")?;
    Ok(())
}

/// `<id> <name> <department> [role]`; role defaults to Employee.
/// None on a wrong argument count or an unknown role.
fn parse_user(args: &[&str]) -> Option<User> {
    let (id, name, department, role) = match args {
        [id, name, department] => (*id, *name, *department, Role::Employee),
        [id, name, department, role] => (*id, *name, *department, Role::from_str(role)?),
        _ => return None,
    };
    Some(User::new(id, name, department, role))
}

/// None for "all" or no argument
fn parse_report_date(arg: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match arg {
        None | Some("all") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s)),
    }
}

fn format_users(users: &[User]) -> String {
    let mut out = format!(
        "  {:<12} {:<24} {:<16} {}\n",
        "ID", "Name", "Department", "Role"
    );
    if users.is_empty() {
        out.push_str("  (no users)\n");
    }
    for u in users {
        out.push_str(&format!(
            "  {:<12} {:<24} {:<16} {}\n",
            u.id, u.name, u.department, u.role
        ));
    }
    out
}
