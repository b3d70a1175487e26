//! Command-line handlers: open a route's view and print what it shows

use anyhow::{anyhow, bail, Result};
use mushaf_lib::align::{AlignedVerse, Alignment};
use mushaf_lib::hadith::{Collection, HadithRecord};
use mushaf_lib::search::{filter_surahs, highlight, search_edition, search_quran, SearchOutcome, SearchScope, Segment};
use mushaf_lib::shell::Route;
use mushaf_lib::source::RecordSource;
use mushaf_lib::state::AppState;
use mushaf_lib::verses::{Edition, UnitKind, Verse};
use mushaf_lib::view::{AyahView, DualSourceView, QuranView, UnitView, ViewState};
use std::sync::Arc;

/// Selection passed on the command line
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub locator: Option<u32>,
    pub edition: Option<String>,
    pub query: Option<String>,
    pub reference: Option<String>,
    pub translation: Option<String>,
}

pub fn print_menu() {
    for route in Route::MENU {
        println!("{:<24} {}", route.label(), route.path());
    }
}

pub async fn open(state: &AppState, route: Route, options: &OpenOptions) -> Result<()> {
    println!("== {} ==", route.label());
    match route {
        Route::Search => search(state, options).await,
        Route::Quran => complete_quran(state, options).await,
        Route::Languages => languages(state, options).await,
        Route::Surahs => surahs(state, options).await,
        Route::Audio => audio(state, options).await,
        Route::Ayah => ayah(state, options).await,
        Route::Juz => unit(state, UnitKind::Juz, options).await,
        Route::Hadith(collection) => hadith(state, collection, options).await,
        Route::Ruku | Route::Page | Route::Hizb | Route::Manzil | Route::Sajda => {
            let kind = route
                .unit_kind()
                .ok_or_else(|| anyhow!("{} has no structural unit", route))?;
            dual_source(state, kind, options).await
        }
    }
}

fn edition(state: &AppState, options: &OpenOptions) -> Edition {
    options
        .edition
        .as_deref()
        .map(Edition::from)
        .unwrap_or_else(|| state.settings.edition.clone())
}

fn settle<T>(view_state: ViewState<T>) -> Result<T> {
    match view_state {
        ViewState::Ready(data) => Ok(data),
        ViewState::Error(message) => Err(anyhow!(message)),
        ViewState::Idle | ViewState::Loading => Err(anyhow!("Nothing was loaded")),
    }
}

fn verse_heading(verse: &Verse) -> String {
    match &verse.surah {
        Some(surah) => format!("{} - Verse {}", surah.english_name, verse.number_in_surah),
        None => format!("Verse {}", verse.number_in_surah),
    }
}

fn render_segments(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::Plain(text) => text.to_string(),
            Segment::Match(text) => format!("[{}]", text),
        })
        .collect()
}

async fn search(state: &AppState, options: &OpenOptions) -> Result<()> {
    let query = options.query.as_deref().unwrap_or_default();
    let source = state.quran_source(UnitKind::Surah);
    let scope = options.locator.map_or(SearchScope::All, SearchScope::Surah);
    let edition = search_edition(edition(state, options).as_str())?;

    match search_quran(&source, query, scope, &edition).await? {
        SearchOutcome::Matches { count, verses } => {
            println!("{} matches", count);
            for verse in &verses {
                println!("\n{}", verse_heading(verse));
                println!("{}", render_segments(&highlight(&verse.text, query)));
            }
        }
        outcome => println!("{}", outcome.message().unwrap_or_default()),
    }
    Ok(())
}

fn print_aligned(verse: &AlignedVerse) {
    let marker = if verse.sajda.is_sajda() { " ۩" } else { "" };
    println!("\n({}){}", verse.number_in_surah, marker);
    println!("{}", verse.arabic_text);
    println!("{}", verse.text);
}

fn print_alignment(alignment: &Alignment) {
    for verse in &alignment.pairs {
        print_aligned(verse);
    }
    if !alignment.is_exact() {
        println!(
            "\n{} translation and {} Arabic verses could not be paired",
            alignment.unmatched_primary.len(),
            alignment.unmatched_secondary.len()
        );
    }
}

async fn complete_quran(state: &AppState, options: &OpenOptions) -> Result<()> {
    let view = QuranView::new(state.quran_source(UnitKind::Surah)).with_mode(state.settings.align_mode);
    view.select_edition(edition(state, options));

    let surahs = settle(view.settled().await)?;
    for surah in surahs.iter() {
        if let Some(header) = &surah.surah {
            println!("\n# {}. {} ({})", header.number, header.english_name, header.name);
        }
        print_alignment(&surah.verses);
    }
    Ok(())
}

async fn languages(state: &AppState, options: &OpenOptions) -> Result<()> {
    let key = options
        .translation
        .as_deref()
        .unwrap_or(&state.settings.translation);
    let sura = options.locator.unwrap_or(1);

    let ayahs = state
        .translation_client()
        .fetch_sura(key, sura)
        .await
        .map_err(|e| anyhow!("Failed to load translations. Please try again later. ({})", e))?;
    for ayah in &ayahs {
        println!("\n({}:{})", ayah.sura, ayah.aya);
        println!("{}", ayah.arabic_text);
        println!("{}", ayah.translation);
        if let Some(footnotes) = ayah.footnotes.as_deref().filter(|f| !f.is_empty()) {
            println!("  {}", footnotes);
        }
    }
    Ok(())
}

async fn surahs(state: &AppState, options: &OpenOptions) -> Result<()> {
    if options.locator.is_some() {
        return unit(state, UnitKind::Surah, options).await;
    }

    let list = state.quran_source(UnitKind::Surah).surah_list().await?;
    let query = options.query.as_deref().unwrap_or_default();
    for surah in filter_surahs(&list, query) {
        println!(
            "{:>3}. {:<20} {:<24} {}",
            surah.number, surah.english_name, surah.english_name_translation, surah.name
        );
    }
    Ok(())
}

async fn unit(state: &AppState, kind: UnitKind, options: &OpenOptions) -> Result<()> {
    let source: Arc<dyn RecordSource> = Arc::new(state.quran_source(kind));
    let view = UnitView::new(kind, source, edition(state, options));
    match options.locator {
        Some(locator) => view.select(locator),
        None => view.reload(),
    }

    let unit = settle(view.settled().await)?;
    if let Some(name) = &unit.english_name {
        println!("{} {}: {}", kind, unit.number, name);
    }
    for verse in &unit.ayahs {
        println!("\n{}", verse_heading(verse));
        println!("{}", verse.text);
    }
    Ok(())
}

async fn dual_source(state: &AppState, kind: UnitKind, options: &OpenOptions) -> Result<()> {
    let source: Arc<dyn RecordSource> = Arc::new(state.quran_source(kind));
    let view = DualSourceView::new(kind, Arc::clone(&source), source)
        .with_editions(edition(state, options), state.settings.arabic_edition.clone())
        .with_mode(state.settings.align_mode);
    match options.locator {
        Some(locator) => view.select(locator),
        None => view.reload(),
    }

    let alignment = settle(view.settled().await)?;
    if kind.is_indexed() {
        println!("{} {}", kind, view.selection().locator);
    }
    print_alignment(&alignment);
    Ok(())
}

async fn ayah(state: &AppState, options: &OpenOptions) -> Result<()> {
    let reference = match options.reference.as_deref() {
        Some(reference) => reference,
        None => bail!("Enter ayah reference (e.g., 2:255 or 262)"),
    };

    let view = AyahView::new(state.quran_source(UnitKind::Surah));
    view.select_edition(edition(state, options));
    view.submit(reference);

    let verse = settle(view.settled().await)?;
    println!("{}", verse.text);
    if let Some(surah) = &verse.surah {
        println!("Surah {} ({}) - Verse {}", surah.name, surah.english_name, verse.number_in_surah);
    }
    Ok(())
}

async fn audio(state: &AppState, options: &OpenOptions) -> Result<()> {
    let client = state.audio_client();

    let surah = match options.locator {
        Some(surah) => surah,
        None => {
            for audio in client.fetch_all().await? {
                println!(
                    "{:>3}. {} ({}), Ayahs: {}",
                    audio.surah_no.unwrap_or_default(),
                    audio.surah_name,
                    audio.surah_name_arabic,
                    audio.total_ayah
                );
            }
            return Ok(());
        }
    };

    let audio = client.fetch(surah).await?;
    println!(
        "{} ({}), Revelation: {}, Ayahs: {}",
        audio.surah_name,
        audio.surah_name_arabic,
        audio.revelation_place.as_deref().unwrap_or("N/A"),
        audio.total_ayah
    );
    for recitation in audio.recitations() {
        println!("  {:<32} {}", recitation.reciter, recitation.url);
    }

    let chosen = match options.query.as_deref() {
        Some(reciter) => audio.recitation_by_reciter(reciter),
        None => audio.default_recitation(),
    };
    let chosen = chosen.ok_or_else(|| anyhow!("No recitation available for surah {}", surah))?;
    let playback = state.playback.start(surah, &chosen.reciter, &chosen.url);
    println!("Playing {} by {}", audio.surah_name, playback.reciter);
    Ok(())
}

fn print_hadith(record: &HadithRecord, position: usize) {
    println!("\n{}", record.title(position));
    println!("{}", record.body());
    println!("Reference: {}", record.reference());
}

async fn hadith(state: &AppState, collection: Collection, options: &OpenOptions) -> Result<()> {
    let records = state.hadith.require(collection)?;
    println!("{}", collection.description());

    let search = records.debounced_filter(state.settings.debounce(), state.settings.match_options());
    search.set_query(options.query.clone().unwrap_or_default());
    let result = search.settled().await;

    if result.is_empty() {
        println!("No Hadiths found.");
        return Ok(());
    }
    for &index in result.matches.iter() {
        if let Some(record) = records.get(index) {
            print_hadith(record, index);
        }
    }
    Ok(())
}
