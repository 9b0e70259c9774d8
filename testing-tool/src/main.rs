use anyhow::{anyhow, Result};
use colored::*;
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const MAX_POLLS: u32 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    println!("{}", "🚗 Daily Car Card Testing Tool".bright_blue().bold());
    println!("{}", "=====================================".bright_blue());
    println!();

    let base_url = prompt_with_default(
        "URL del servidor",
        "http://localhost:3000/app/calendar",
    )?;
    let client = reqwest::Client::new();

    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🃏 Pedir carta de una fecha");
        println!("2. 📅 Pedir carta de hoy");
        println!("3. ⏮️  Pedir carta de ayer");
        println!("4. 🖼️  Ver galería de un mes");
        println!("5. 🚪 Salir");
        print!("{}", "Selecciona una opción (1-5): ".bright_yellow());
        io::stdout().flush()?;

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;

        let result = match choice.trim() {
            "1" => {
                let date = prompt_with_default("Fecha (YYYY-MM-DD)", "2025-03-10")?;
                request_card(&client, &format!("{}/api/card?date={}", base_url, date)).await
            }
            "2" => request_card(&client, &format!("{}/api/card/today", base_url)).await,
            "3" => request_card(&client, &format!("{}/api/card/yesterday", base_url)).await,
            "4" => {
                let month = prompt_with_default("Mes (YYYY-MM, vacío = actual)", "")?;
                show_gallery(&client, &base_url, &month).await
            }
            "5" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{}", format!("❌ Error: {}", e).bright_red());
        }
    }

    Ok(())
}

fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    print!("{}", format!("{} [{}]: ", label, default).bright_yellow());
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    let value = value.trim();
    Ok(if value.is_empty() { default } else { value }.trim_end_matches('/').to_string())
}

/// Pedir la carta y seguir preguntando mientras el servidor responda 202
async fn request_card(client: &reqwest::Client, url: &str) -> Result<()> {
    println!();
    println!("{}", "🃏 PIDIENDO CARTA...".bright_cyan().bold());
    println!("{} {}", "📤 URL:".bright_blue(), url);

    for attempt in 1..=MAX_POLLS {
        let response = client.get(url).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        match status.as_u16() {
            200 => {
                println!("{}", "✅ CARTA LISTA:".bright_green().bold());
                print_card(&body);
                println!("{}", serde_json::to_string_pretty(&body)?);
                return Ok(());
            }
            202 => {
                println!(
                    "{}",
                    format!("⏳ Generando... (intento {}/{})", attempt, MAX_POLLS).bright_yellow()
                );
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            _ => {
                return Err(anyhow!("{} {}", status, body));
            }
        }
    }

    Err(anyhow!("la carta sigue generándose tras {} intentos", MAX_POLLS))
}

fn print_card(card: &Value) {
    let holo = if card["is_holo"].as_bool().unwrap_or(false) {
        "✨ HOLO".bright_magenta().bold().to_string()
    } else {
        "normal".to_string()
    };
    println!(
        "   {} {} {} ({}) - {}",
        card["date"].as_str().unwrap_or("?").bright_white(),
        card["maker"].as_str().unwrap_or("?"),
        card["model"].as_str().unwrap_or("?"),
        card["selected_color"].as_str().unwrap_or("?"),
        holo
    );
    println!("   🖼️  {}", card["imageUrl"].as_str().unwrap_or("?"));
}

async fn show_gallery(client: &reqwest::Client, base_url: &str, month: &str) -> Result<()> {
    let url = if month.is_empty() {
        format!("{}/api/gallery", base_url)
    } else {
        format!("{}/api/gallery?month={}", base_url, month)
    };

    println!();
    println!("{}", "🖼️  GALERÍA".bright_cyan().bold());
    println!("{} {}", "📤 URL:".bright_blue(), url);

    let response = client.get(&url).send().await?;
    let status = response.status();
    let body: Value = response.json().await?;
    if !status.is_success() {
        return Err(anyhow!("{} {}", status, body));
    }

    println!(
        "{}",
        format!(
            "📅 {} (anterior: {}, siguiente: {}, hoy: {})",
            body["month"].as_str().unwrap_or("?"),
            body["prev_month"].as_str().unwrap_or("?"),
            body["next_month"].as_str().unwrap_or("?"),
            body["today"].as_str().unwrap_or("?"),
        )
        .bright_green()
        .bold()
    );

    let cells = body["cells"].as_array().cloned().unwrap_or_default();
    let mut with_card = 0;
    for cell in cells.iter().filter(|c| !c.is_null()) {
        let date = cell["date"].as_str().unwrap_or("?");
        let card = &cell["card"];
        if card.is_null() {
            println!("   {} {}", date, "-".dimmed());
            continue;
        }
        with_card += 1;
        let holo = if card["is_holo"].as_bool().unwrap_or(false) { " ✨" } else { "" };
        println!(
            "   {} {} {}{}",
            date.bright_white(),
            card["maker"].as_str().unwrap_or("?"),
            card["model"].as_str().unwrap_or("?"),
            holo
        );
    }
    println!("{}", format!("📦 {} cartas en el mes", with_card).bright_green());

    Ok(())
}
