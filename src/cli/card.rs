//! Printing a single idea.

use funs::{Item, Picker, StateStore};

use super::terminal::Colorize;

/// Prints an idea as a card, with its prompt pool hint if it has one.
pub fn print<S: StateStore>(picker: &Picker<S>, item: &Item) {
    println!("{}", item.title.heading());

    let mut meta = vec![format!("{} min", item.duration_minutes)];
    meta.extend(item.category.clone());
    meta.extend(item.energy.as_ref().map(|energy| format!("energy: {energy}")));
    println!("{}", meta.join(" · ").dim());

    if !item.description.is_empty() {
        println!();
        println!("{}", item.description);
    }

    if !item.needs.is_empty() {
        let needs: Vec<_> = item.needs.iter().map(|need| need.as_str()).collect();
        println!();
        println!("Needs: {}", needs.join(", ").info());
    }

    if let Some(link) = &item.link {
        let label = item.link_label.as_deref().unwrap_or("Link");
        println!("{label}: {link}");
    }

    if let Some(pool) = picker.pool_for(item) {
        println!(
            "{}",
            format!("{}: run `funs prompt {}`", pool.label, pool.name).dim()
        );
    }

    println!("{}", format!("id: {}", item.id).dim());
}
