//! Built-in shop corpus and loader for replacement corpora

use crate::errors::{AssistantError, Result};
use serde::Deserialize;
use std::path::Path;

/// Zielony Doom knowledge base, 52 statements
pub const DEFAULT_FACTS: &[&str] = &[
    // Shop
    "Sklep 'Zielony Doom' oferuje ponad 200 gatunków roślin doniczkowych i ogrodowych.",
    "Zespół sklepu 'Zielony Doom' doradza w wyborze roślin dla początkujących ogrodników.",
    "Kontakt: pomoc@zielonydoom.pl lub czat na stronie.",
    "Sklep 'Zielony Doom' działa od 2018 roku i specjalizuje się w roślinach tropikalnych i egzotycznych.",
    "Oferujemy konsultacje online z naszym botanikiem - umów się przez formularz na stronie.",
    // Popular plants
    "Popularne rośliny doniczkowe to Monstera deliciosa, Zamioculcas zamiifolia, Fikus elastica i Sansevieria.",
    "Rośliny cieniolubne to m.in. Zamioculcas i Sansevieria.",
    "Pomagamy dobrać rośliny do mieszkań, biur i ogrodów o różnym poziomie nasłonecznienia.",
    "Dla początkujących polecamy rośliny łatwe w pielęgnacji: Zamioculcas, Sansevieria, Pothos i Chlorophytum.",
    "Rośliny oczyszczające powietrze: Sansevieria, Chlorophytum, Epipremnum aureum i Spathiphyllum.",
    // Monstera
    "Monstera lubi jasne, rozproszone światło i umiarkowane podlewanie.",
    "Monstera deliciosa osiąga do 3 metrów wysokości w warunkach domowych.",
    "Podlewaj monsterę gdy górna warstwa podłoża (2-3 cm) wyschnie.",
    "Monstera lubi wysoką wilgotność - zraszaj liście 2-3 razy w tygodniu.",
    "Monstera wymaga podpory (pala kokosowego) gdy urośnie powyżej 80 cm.",
    // Fikus
    "Fikus elastica wymaga stałej wilgotności podłoża, ale nie znosi przelania.",
    "Fikus lubi jasne stanowisko, ale nie bezpośrednie słońce - liście mogą się poparzyć.",
    "Fikus zrzuca liście gdy zmieni się jego lokalizacja - to normalna reakcja stresowa.",
    "Podlewaj fikus co 5-7 dni latem, rzadziej zimą.",
    // Zamioculcas
    "Zamioculcas (ZZ plant) jest niezwykle odporny - przeżywa zaniedbania i brak światła.",
    "Podlewaj Zamioculcas rzadko - co 2-3 tygodnie, gdy podłoże całkowicie wyschnie.",
    "Zamioculcas przechowuje wodę w korzeniach, więc przelanie jest dla niego gorsze niż niedopodlewanie.",
    // Sansevieria
    "Sansevieria (język teściowej) jest jedną z najtwardszych roślin - idealna dla zapracowanych.",
    "Sansevieria potrzebuje bardzo mało wody - podlewaj raz na 3-4 tygodnie.",
    "Sansevieria doskonale radzi sobie w ciemnych kątach, ale rośnie szybciej przy więcej świetle.",
    // Other plants
    "Pothos (Epipremnum aureum) to pnącze idealne na półki - szybko rośnie i łatwe w pielęgnacji.",
    "Sukulent Aloe vera lubi pełne słońce i bardzo rzadkie podlewanie (co 3-4 tygodnie).",
    "Storczyki wymagają specjalnego podłoża (kora sosnowa) i podlewania przez moczenie co 7-10 dni.",
    "Paproć Nephrolepis lubi wilgotne podłoże i wysoką wilgotność powietrza - idealna do łazienki.",
    "Kaktus wymaga pełnego słońca i podlewania raz na miesiąc latem, zimą prawie wcale.",
    // Care: light
    "Większość roślin doniczkowych preferuje jasne, rozproszone światło - 2-3 metry od okna.",
    "Bezpośrednie słońce może poparzyć liście większości roślin domowych - objawy to brązowe plamy.",
    "Rośliny w ciemnych pomieszczeniach rosną wolniej - rozważ lampę roślinną (growlight) zimą.",
    // Care: watering
    "Złota zasada podlewania: lepiej za mało niż za dużo - większość roślin ginie od przelania.",
    "Testuj wilgotność podłoża palcem (2-3 cm głębokości) przed podlewaniem.",
    "Używaj odstałej wody w temperaturze pokojowej - chlor z kranu może szkodzić roślinom.",
    "Przelana roślina ma żółte, miękkie liście i zgniłe korzenie - zmień podłoże i ogranicz podlewanie.",
    // Care: fertilizing
    "Nawóz doniczkowy stosuj od marca do września co 2 tygodnie, zimą nie nawożenie (spoczynek).",
    "Używaj nawozu płynnego w dawce zalecanej przez producenta - przedawkowanie pali korzenie.",
    // Deliveries
    "Dostarczamy rośliny w ciągu 1-3 dni roboczych na terenie całej Polski.",
    "Zamówienia powyżej 200 zł objęte są darmową dostawą.",
    "Rośliny pakujemy w biodegradowalne opakowania z zabezpieczeniem termicznym w zimie.",
    "W okresie zimowym do paczki dołączamy ogrzewacz (heat pack), jeśli temperatura spada poniżej 5°C.",
    "Kurier dostarcza rośliny do 18:00 - możesz wybrać preferowany dzień dostawy przy zamówieniu.",
    // Returns
    "Klient ma 14 dni na zwrot zakupionego produktu.",
    "Jeśli roślina dotarła uszkodzona, zrób zdjęcie i zgłoś do 48h - wymienimy na nową.",
    "Zwracamy pieniądze lub wymieniamy produkt - wybór należy do klienta.",
    // Accessories
    "W ofercie znajdują się także nawozy, doniczki, podłoża i akcesoria do pielęgnacji roślin.",
    "Każdy produkt ma opis z zaleceniami dotyczącymi podlewania, światła i nawożenia.",
    "Oferujemy podłoża specjalistyczne: do palm, sukulentów, storczyków i roślin zielonych.",
    "Doniczki ceramiczne dostępne w rozmiarach 10-30 cm, z podstawką i otworami drenażowymi.",
    "Akcesoria do pielęgnacji: nożyce ogrodnicze, mgiełka, higrometr glebowy, pały kokosowe.",
];

/// Built-in corpus as owned strings
pub fn default_facts() -> Vec<String> {
    DEFAULT_FACTS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct FactsFile {
    facts: Vec<String>,
}

/// Load a corpus from a TOML file of the form `facts = ["...", ...]`
///
/// Blank entries are dropped; order is preserved.
pub fn load_facts_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AssistantError::ConfigError(format!("cannot read knowledge file {}: {}", path.display(), e))
    })?;
    let file: FactsFile = toml::from_str(&contents).map_err(|e| {
        AssistantError::ConfigError(format!("malformed knowledge file {}: {}", path.display(), e))
    })?;

    Ok(file
        .facts
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_corpus_size() {
        assert_eq!(DEFAULT_FACTS.len(), 52);
        assert!(DEFAULT_FACTS.iter().all(|f| !f.trim().is_empty()));
    }

    #[test]
    fn test_load_facts_file_keeps_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"facts = ["Pierwszy fakt.", "  ", "Drugi fakt."]"#).unwrap();

        let facts = load_facts_file(file.path()).unwrap();
        assert_eq!(facts, vec!["Pierwszy fakt.", "Drugi fakt."]);
    }

    #[test]
    fn test_load_facts_file_missing() {
        let err = load_facts_file(Path::new("/nonexistent/facts.toml")).unwrap_err();
        assert!(matches!(err, AssistantError::ConfigError(_)));
    }
}
