use crate::EntityLabel;

const COUNTRIES: &[&str] = &[
    "Argentina", "Australia", "Austria", "Belgium", "Brazil", "Cambodia", "Canada", "Chile",
    "China", "Colombia", "Costa Rica", "Croatia", "Cuba", "Czech Republic", "Denmark", "Egypt",
    "England", "Finland", "France", "Germany", "Greece", "Iceland", "India", "Indonesia",
    "Ireland", "Israel", "Italy", "Japan", "Jordan", "Kenya", "Laos", "Malaysia", "Mexico",
    "Morocco", "Nepal", "Netherlands", "New Zealand", "Norway", "Peru", "Philippines", "Poland",
    "Portugal", "Scotland", "Singapore", "South Africa", "South Korea", "Spain", "Sri Lanka",
    "Sweden", "Switzerland", "Tanzania", "Thailand", "Turkey", "United Kingdom",
    "United States", "USA", "Vietnam", "Wales",
];

const CITIES: &[&str] = &[
    "Amsterdam", "Athens", "Atlanta", "Austin", "Bangkok", "Barcelona", "Beijing", "Berlin",
    "Bogota", "Boston", "Brussels", "Budapest", "Buenos Aires", "Cairo", "Cancun",
    "Cape Town", "Chicago", "Copenhagen", "Dallas", "Delhi", "Denver", "Dubai", "Dublin",
    "Edinburgh", "Florence", "Hanoi", "Havana", "Helsinki", "Hong Kong", "Honolulu", "Houston",
    "Istanbul", "Jerusalem", "Kyoto", "Las Vegas", "Lima", "Lisbon", "London", "Los Angeles",
    "Madrid", "Marrakech", "Melbourne", "Mexico City", "Miami", "Milan", "Montreal", "Moscow",
    "Mumbai", "Munich", "Nairobi", "Naples", "Nashville", "New Orleans", "New York",
    "New York City", "Osaka", "Oslo", "Palm Springs", "Paris", "Philadelphia", "Phoenix",
    "Portland", "Prague", "Quebec City", "Reykjavik", "Rio de Janeiro", "Rome", "San Diego",
    "San Francisco", "Santa Barbara", "Santa Monica", "Santiago", "Seattle", "Seoul",
    "Seville", "Shanghai", "Stockholm", "Sydney", "Taipei", "Tel Aviv", "Tokyo", "Toronto",
    "Vancouver", "Venice", "Vienna", "Warsaw", "Washington", "Zurich",
];

const US_STATES: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa", "Kansas",
    "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan", "Minnesota",
    "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire", "New Jersey",
    "New Mexico", "North Carolina", "North Dakota", "Ohio", "Oklahoma", "Oregon",
    "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota", "Tennessee", "Texas",
    "Utah", "Vermont", "Virginia", "West Virginia", "Wisconsin", "Wyoming",
];

const LOCATIONS: &[&str] = &[
    "Alps", "Amazon", "Atlantic Ocean", "Death Valley", "Grand Canyon", "Lake Tahoe",
    "Mediterranean", "Mojave Desert", "Pacific Ocean", "Rocky Mountains", "Sahara",
    "Yosemite Valley",
];

const FACILITIES: &[&str] = &[
    "Big Ben", "Central Park", "Colosseum", "Eiffel Tower", "Golden Gate Bridge",
    "Griffith Observatory", "Hollywood Walk of Fame", "Louvre", "Sagrada Familia",
    "Santa Monica Pier", "Statue of Liberty", "Times Square",
];

pub(crate) fn entries() -> impl Iterator<Item = (&'static str, EntityLabel)> {
    COUNTRIES
        .iter()
        .chain(CITIES)
        .chain(US_STATES)
        .map(|name| (*name, EntityLabel::Gpe))
        .chain(LOCATIONS.iter().map(|name| (*name, EntityLabel::Loc)))
        .chain(FACILITIES.iter().map(|name| (*name, EntityLabel::Fac)))
}
