//! Administrative regions and divisions of Cameroon.
//!
//! Mirrors the rows inserted by the `seed_regions` migration so the in-memory
//! store and a freshly migrated database agree on ids.

/// `(id, name, name_en, slug)`
pub const REGIONS: &[(i32, &str, &str, &str)] = &[
    (1, "Adamaoua", "Adamawa", "adamaoua"),
    (2, "Centre", "Centre", "centre"),
    (3, "Est", "East", "est"),
    (4, "Extrême-Nord", "Far North", "extreme-nord"),
    (5, "Littoral", "Littoral", "littoral"),
    (6, "Nord", "North", "nord"),
    (7, "Nord-Ouest", "Northwest", "nord-ouest"),
    (8, "Ouest", "West", "ouest"),
    (9, "Sud", "South", "sud"),
    (10, "Sud-Ouest", "Southwest", "sud-ouest"),
];

/// `(id, region_id, name, slug)`
pub const DIVISIONS: &[(i32, i32, &str, &str)] = &[
    (1, 1, "Djérem", "djerem"),
    (2, 1, "Faro-et-Déo", "faro-et-deo"),
    (3, 1, "Mayo-Banyo", "mayo-banyo"),
    (4, 1, "Mbéré", "mbere"),
    (5, 1, "Vina", "vina"),
    (6, 2, "Haute-Sanaga", "haute-sanaga"),
    (7, 2, "Lekié", "lekie"),
    (8, 2, "Mbam-et-Inoubou", "mbam-et-inoubou"),
    (9, 2, "Mbam-et-Kim", "mbam-et-kim"),
    (10, 2, "Méfou-et-Afamba", "mefou-et-afamba"),
    (11, 2, "Méfou-et-Akono", "mefou-et-akono"),
    (12, 2, "Mfoundi", "mfoundi"),
    (13, 2, "Nyong-et-Kéllé", "nyong-et-kelle"),
    (14, 2, "Nyong-et-Mfoumou", "nyong-et-mfoumou"),
    (15, 2, "Nyong-et-So'o", "nyong-et-so-o"),
    (16, 3, "Boumba-et-Ngoko", "boumba-et-ngoko"),
    (17, 3, "Haut-Nyong", "haut-nyong"),
    (18, 3, "Kadey", "kadey"),
    (19, 3, "Lom-et-Djérem", "lom-et-djerem"),
    (20, 4, "Diamaré", "diamare"),
    (21, 4, "Logone-et-Chari", "logone-et-chari"),
    (22, 4, "Mayo-Danay", "mayo-danay"),
    (23, 4, "Mayo-Kani", "mayo-kani"),
    (24, 4, "Mayo-Sava", "mayo-sava"),
    (25, 4, "Mayo-Tsanaga", "mayo-tsanaga"),
    (26, 5, "Moungo", "moungo"),
    (27, 5, "Nkam", "nkam"),
    (28, 5, "Sanaga-Maritime", "sanaga-maritime"),
    (29, 5, "Wouri", "wouri"),
    (30, 6, "Bénoué", "benoue"),
    (31, 6, "Faro", "faro"),
    (32, 6, "Mayo-Louti", "mayo-louti"),
    (33, 6, "Mayo-Rey", "mayo-rey"),
    (34, 7, "Boyo", "boyo"),
    (35, 7, "Bui", "bui"),
    (36, 7, "Donga-Mantung", "donga-mantung"),
    (37, 7, "Menchum", "menchum"),
    (38, 7, "Mezam", "mezam"),
    (39, 7, "Momo", "momo"),
    (40, 7, "Ngo-Ketunjia", "ngo-ketunjia"),
    (41, 8, "Bamboutos", "bamboutos"),
    (42, 8, "Haut-Nkam", "haut-nkam"),
    (43, 8, "Hauts-Plateaux", "hauts-plateaux"),
    (44, 8, "Koung-Khi", "koung-khi"),
    (45, 8, "Menoua", "menoua"),
    (46, 8, "Mifi", "mifi"),
    (47, 8, "Ndé", "nde"),
    (48, 8, "Noun", "noun"),
    (49, 9, "Dja-et-Lobo", "dja-et-lobo"),
    (50, 9, "Mvila", "mvila"),
    (51, 9, "Océan", "ocean"),
    (52, 9, "Vallée-du-Ntem", "vallee-du-ntem"),
    (53, 10, "Fako", "fako"),
    (54, 10, "Koupé-Manengouba", "koupe-manengouba"),
    (55, 10, "Lebialem", "lebialem"),
    (56, 10, "Manyu", "manyu"),
    (57, 10, "Meme", "meme"),
    (58, 10, "Ndian", "ndian"),
];
