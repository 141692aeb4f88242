// ============================================================================
// Reference Tables
// ============================================================================
//
// Static lists the generator samples from. They are plain data so callers
// (and tests) can swap in their own tables.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("Reference table '{0}' is empty")]
    EmptyTable(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    pub names: Vec<String>,
    pub cities: Vec<String>,
    pub regions: Vec<String>,
    pub delivery_services: Vec<String>,
    pub item_names: Vec<String>,
    pub brands: Vec<String>,
    pub locales: Vec<String>,
    pub email_domains: Vec<String>,
}

impl ReferenceData {
    /// Every table must have at least one entry so that sampling never fails.
    pub fn validate(&self) -> Result<(), ReferenceDataError> {
        let tables: [(&'static str, &Vec<String>); 8] = [
            ("names", &self.names),
            ("cities", &self.cities),
            ("regions", &self.regions),
            ("delivery_services", &self.delivery_services),
            ("item_names", &self.item_names),
            ("brands", &self.brands),
            ("locales", &self.locales),
            ("email_domains", &self.email_domains),
        ];

        for (name, table) in tables {
            if table.is_empty() {
                return Err(ReferenceDataError::EmptyTable(name));
            }
        }
        Ok(())
    }

    /// Tables with a single entry each, handy for pinning sampled fields.
    #[cfg(test)]
    pub fn single(value: &str) -> Self {
        let one = || vec![value.to_string()];
        Self {
            names: one(),
            cities: one(),
            regions: one(),
            delivery_services: one(),
            item_names: one(),
            brands: one(),
            locales: one(),
            email_domains: one(),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            names: owned(&[
                "Иван Иванов", "Мария Петрова", "Алексей Сидоров", "Елена Козлова",
                "Дмитрий Волков", "Анна Морозова", "Сергей Соколов", "Ольга Лебедева",
                "Николай Козлов", "Татьяна Новикова", "Андрей Морозов", "Наталья Петрова",
                "Владимир Соловьев", "Екатерина Васильева", "Михаил Зайцев", "Ирина Семенова",
                "Александр Голубев", "Людмила Виноградова", "Виктор Богданов", "Галина Воробьева",
            ]),
            cities: owned(&[
                "Москва", "Санкт-Петербург", "Новосибирск", "Екатеринбург", "Казань",
                "Нижний Новгород", "Челябинск", "Самара", "Ростов-на-Дону", "Уфа",
                "Волгоград", "Пермь", "Воронеж", "Краснодар", "Саратов",
            ]),
            regions: owned(&[
                "Московская область", "Ленинградская область", "Свердловская область",
                "Ростовская область", "Краснодарский край", "Татарстан", "Башкортостан",
                "Челябинская область", "Самарская область", "Нижегородская область",
            ]),
            delivery_services: owned(&[
                "СДЭК", "Boxberry", "Почта России", "DHL", "FedEx", "UPS",
                "Яндекс.Доставка", "СберЛогистика", "ПЭК", "Деловые Линии",
            ]),
            item_names: owned(&[
                "Смартфон iPhone 15 Pro", "Ноутбук MacBook Air", "Наушники AirPods Pro",
                "Планшет iPad Air", "Умные часы Apple Watch", "Телевизор Samsung QLED",
                "Игровая консоль PlayStation 5", "Фотоаппарат Canon EOS R",
                "Беспроводная колонка JBL", "Электронная книга Kindle",
                "Монитор Dell UltraSharp", "Клавиатура Logitech MX Keys",
                "Мышь Logitech MX Master", "Веб-камера Logitech StreamCam",
                "Микрофон Blue Yeti", "Принтер HP LaserJet", "Сканер Epson Perfection",
                "МФУ Canon Pixma", "Внешний жесткий диск WD", "SSD накопитель Samsung",
            ]),
            brands: owned(&[
                "Apple", "Samsung", "Sony", "LG", "Canon", "Nikon", "Dell", "HP",
                "Lenovo", "Asus", "Logitech", "JBL", "Bose", "Sennheiser", "WD",
                "Seagate", "Kingston", "Corsair", "Razer", "SteelSeries",
            ]),
            locales: owned(&["ru", "en", "de", "fr", "es"]),
            email_domains: owned(&["gmail.com", "yandex.ru", "mail.ru", "outlook.com"]),
        }
    }
}
