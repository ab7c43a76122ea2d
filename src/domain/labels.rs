//! Localized chart and report strings.

use crate::domain::Lang;

/// Every user-visible string used by charts and the HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub date: &'static str,
    pub doubling_time: &'static str,
    pub doubling_time_unit: &'static str,
    pub number_of_cases: &'static str,
    pub number_of_daily_cases: &'static str,
    pub number_of_tests: &'static str,
    pub number_of_deaths: &'static str,
    pub number_of_daily_deaths: &'static str,

    pub total_cases: &'static str,
    pub new_cases: &'static str,
    pub deaths: &'static str,
    pub intensive_care: &'static str,
    pub tests: &'static str,

    pub last_update: &'static str,
    pub national_heading: &'static str,
    pub regional_heading: &'static str,
    pub provincial_heading: &'static str,
    /// Chart title suffixes.
    pub daily_suffix: &'static str,
    pub tests_suffix: &'static str,
    pub cases_suffix: &'static str,
    pub deaths_suffix: &'static str,
    pub trend_suffix: &'static str,
    pub fit_caption: &'static str,
    pub trend_caption: &'static str,
    pub failed: &'static str,
}

impl Labels {
    pub fn for_lang(lang: Lang) -> Self {
        match lang {
            Lang::It => Self::italian(),
            Lang::En => Self::english(),
        }
    }

    /// Legend text for a fit overlay, e.g. `Doubling time = 4.3 days`.
    pub fn doubling_label(&self, doubling_time: f64) -> String {
        format!(
            "{} = {:.1} {}",
            self.doubling_time, doubling_time, self.doubling_time_unit
        )
    }

    /// Chart title such as `Lombardia - daily cases`.
    pub fn titled(&self, name: &str, suffix: &str) -> String {
        format!("{name} - {suffix}")
    }

    fn italian() -> Self {
        Self {
            date: "Data",
            doubling_time: "T raddoppio",
            doubling_time_unit: "gg",
            number_of_cases: "Numero di casi totali",
            number_of_daily_cases: "Numero di casi al giorno",
            number_of_tests: "Tamponi",
            number_of_deaths: "Numero di deceduti totali",
            number_of_daily_deaths: "Numero di deceduti al giorno",

            total_cases: "Casi totali",
            new_cases: "Nuovi casi",
            deaths: "Deceduti",
            intensive_care: "Terapia intensiva",
            tests: "Tamponi",

            last_update: "Ultimo aggiornamento",
            national_heading: "Dati nazionali",
            regional_heading: "Dati regionali",
            provincial_heading: "Dati provinciali",
            daily_suffix: "casi giornalieri",
            tests_suffix: "tamponi",
            cases_suffix: "numero di casi",
            deaths_suffix: "decessi",
            trend_suffix: "andamento",
            fit_caption: "Fit esponenziale sugli ultimi {n} giorni",
            trend_caption: "Fit esponenziale sugli ultimi {n} giorni, ripetuto per la data odierna, i due giorni precedenti e una settimana fa",
            failed: "Elaborazione non riuscita",
        }
    }

    fn english() -> Self {
        Self {
            date: "Date",
            doubling_time: "Doubling time",
            doubling_time_unit: "days",
            number_of_cases: "Total number of cases",
            number_of_daily_cases: "Number of cases per day",
            number_of_tests: "Number of tests",
            number_of_deaths: "Total number of deaths",
            number_of_daily_deaths: "Number of deaths per day",

            total_cases: "Total cases",
            new_cases: "New cases",
            deaths: "Deaths",
            intensive_care: "Intensive care",
            tests: "Tests",

            last_update: "Last update",
            national_heading: "National data",
            regional_heading: "Regional data",
            provincial_heading: "Provincial data",
            daily_suffix: "daily cases",
            tests_suffix: "tests",
            cases_suffix: "Cases",
            deaths_suffix: "Deaths",
            trend_suffix: "trend",
            fit_caption: "Exponential fit over the last {n} days",
            trend_caption: "Exponential fit over the last {n} days, repeated for today, the two previous days and one week ago",
            failed: "Processing failed",
        }
    }

    /// Caption with the window size substituted.
    pub fn caption(template: &str, npoints: usize) -> String {
        template.replace("{n}", &npoints.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_label_is_localized() {
        let it = Labels::for_lang(Lang::It);
        let en = Labels::for_lang(Lang::En);
        assert_eq!(it.doubling_label(4.26), "T raddoppio = 4.3 gg");
        assert_eq!(en.doubling_label(4.26), "Doubling time = 4.3 days");
    }

    #[test]
    fn caption_substitutes_window() {
        let en = Labels::for_lang(Lang::En);
        assert_eq!(
            Labels::caption(en.fit_caption, 10),
            "Exponential fit over the last 10 days"
        );
    }
}
