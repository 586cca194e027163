use anyhow::Result;

use crate::cli::args::MemorialCommands;
use crate::models::{Deceased, NewDeceased};
use crate::services::memorials;
use crate::utils::time::{date_string, parse_date};

use super::{heading, opt, Session, DIM, GREEN, RED};

pub fn handle_memorial(s: &Session, action: &MemorialCommands) -> Result<()> {
    let conn = &s.conn;
    let actor = s.actor()?;
    match action {
        MemorialCommands::Add {
            name,
            died,
            born,
            relation,
            bio,
            no_memorial_day,
            frequency,
        } => {
            let new = NewDeceased {
                name: name.clone(),
                death_date: parse_date(died)?,
                birth_date: born.as_deref().map(parse_date).transpose()?,
                relation: relation.clone(),
                biography: bio.clone(),
                memorial_day: !*no_memorial_day,
                memorial_frequency: *frequency,
            };
            let d = memorials::add(conn, &actor, new)?;
            if s.emit(&d)? {
                return Ok(());
            }
            println_colored!(GREEN, "  ✓ Added {} (#{})", d.name, d.id);
            if d.memorial_day {
                println_colored!(
                    DIM,
                    "  A {} memorial khatma will start on `khatma run memorials`",
                    d.memorial_frequency.as_str()
                );
            }
        }
        MemorialCommands::List => {
            let list = memorials::list(conn, &actor)?;
            if s.emit(&list)? {
                return Ok(());
            }
            heading("Memorials");
            if list.is_empty() {
                println_colored!(DIM, "  No records yet");
            }
            for d in &list {
                println!(
                    "  #{:<4} {:<28} died {}  {}",
                    d.id,
                    d.name,
                    date_string(d.death_date),
                    opt(d.relation.as_deref())
                );
            }
            println!();
        }
        MemorialCommands::Show { deceased } => {
            let d = memorials::get(conn, &actor, deceased)?;
            if s.emit(&d)? {
                return Ok(());
            }
            show(&d);
        }
        MemorialCommands::Delete { deceased } => {
            memorials::delete(conn, &actor, deceased)?;
            println_colored!(RED, "  ✗ Deleted memorial record '{}'", deceased);
        }
    }
    Ok(())
}

fn show(d: &Deceased) {
    heading(&d.name);
    let born = d.birth_date.map(date_string);
    println!("  Born:       {}", opt(born.as_deref()));
    println!("  Died:       {}", date_string(d.death_date));
    if let Some(age) = d.age_at_death() {
        println!("  Age:        {}", age);
    }
    println!("  Relation:   {}", opt(d.relation.as_deref()));
    let schedule = if d.memorial_day { d.memorial_frequency.display_name() } else { "off" };
    println!("  Memorials:  {}", schedule);
    if let Some(bio) = &d.biography {
        println!();
        println!("  {}", bio);
    }
    println!();
}
